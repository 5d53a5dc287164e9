use std::{path::Path, time::Duration};

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::check::{CheckConfig, CheckError, Thresholds};
use crate::nagios::Failure;
use crate::status::Metric;
use crate::ups::Endpoint;

// The following define how the ups is reached.
const PORT: u16 = 80; // Port of the ups web interface.
const TIMEOUT_SECS: u64 = 1; // Seconds to wait for the status page.

/// Raw warning/critical ranges of one metric.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ThresholdPair {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical: Option<String>,
}

impl ThresholdPair {
    pub fn new(warning: &str, critical: &str) -> ThresholdPair {
        ThresholdPair {
            warning: Some(warning.to_string()),
            critical: Some(critical.to_string()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ThresholdSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_voltage: Option<ThresholdPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_voltage: Option<ThresholdPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_frequency: Option<ThresholdPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_frequency: Option<ThresholdPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_level: Option<ThresholdPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_celsius: Option<ThresholdPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_capacity: Option<ThresholdPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_remaining: Option<ThresholdPair>,
}

impl ThresholdSettings {
    pub fn get(&self, metric: Metric) -> Option<&ThresholdPair> {
        match metric {
            Metric::InputVoltage => self.input_voltage.as_ref(),
            Metric::OutputVoltage => self.output_voltage.as_ref(),
            Metric::InputFrequency => self.input_frequency.as_ref(),
            Metric::OutputFrequency => self.output_frequency.as_ref(),
            Metric::LoadLevel => self.load_level.as_ref(),
            Metric::Temperature => self.temp_celsius.as_ref(),
            Metric::BatteryCapacity => self.battery_capacity.as_ref(),
            Metric::BatteryRemainingTime => self.battery_remaining.as_ref(),
            Metric::OutputCurrent | Metric::BatteryVoltage => None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub port: u16,
    pub timeout_secs: u64,
    #[serde(default)]
    pub thresholds: ThresholdSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: None,
            port: PORT,
            timeout_secs: TIMEOUT_SECS,
            thresholds: ThresholdSettings::default(),
        }
    }
}

/// Values given on the command line, applied over the config file.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    pub thresholds: ThresholdSettings,
}

impl Settings {
    /// Layers the defaults, the TOML file at `path` (if there is one) and
    /// `overrides`.
    pub fn load(path: &Path, overrides: &Overrides) -> Result<Settings, figment::Error> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Serialized::defaults(overrides))
            .extract()
    }

    pub fn endpoint(&self) -> Result<Endpoint, Failure> {
        let host = self.host.clone().ok_or_else(|| {
            Failure::Usage(
                "the UPS host is required, use -H/--host or `host` in the config file".to_string(),
            )
        })?;

        Ok(Endpoint {
            host,
            port: self.port,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }

    /// Parses every configured range, before anything touches the network.
    pub fn check_config(&self) -> Result<CheckConfig, CheckError> {
        let mut config = CheckConfig::new();
        for metric in Metric::THRESHOLDED {
            if let Some(pair) = self.thresholds.get(metric) {
                let thresholds =
                    Thresholds::parse(metric, pair.warning.as_deref(), pair.critical.as_deref())?;
                config = config.with(metric, thresholds);
            }
        }
        Ok(config)
    }
}
