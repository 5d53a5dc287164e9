use crate::status::{DeviceState, Metric, Readings};

use std::{num::ParseIntError, time::Duration};

// The status page lists one value per line, in a fixed order.
const STATUS_PATH: &str = "/cgi-bin/realInfo.cgi";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

// Line indices of the fields we use.
const MODE: usize = 0;
const UPS_TEMP: usize = 1;
const FAULT_TYPE: usize = 7;
const UPS_WARNING: usize = 8;
const BATTERY_VOLTAGE: usize = 9;
const BATTERY_CAPACITY: usize = 10;
const BATTERY_REMAINING: usize = 11;
const INPUT_FREQUENCY: usize = 12;
const INPUT_VOLTAGE: usize = 13;
const OUTPUT_FREQUENCY: usize = 15;
const OUTPUT_VOLTAGE: usize = 16;
const LOAD_LEVEL: usize = 18;
const OUTPUT_CURRENT: usize = 36;

// The firmware reports this many lines, newer ones may append more.
const EXPECTED_LINES: usize = 50;

// Numeric fields and how many units of the field make one unit of the metric.
const NUMERIC_FIELDS: [(Metric, usize, f64); 10] = [
    (Metric::Temperature, UPS_TEMP, 10.0),
    (Metric::BatteryVoltage, BATTERY_VOLTAGE, 10.0),
    (Metric::BatteryCapacity, BATTERY_CAPACITY, 1.0),
    (Metric::BatteryRemainingTime, BATTERY_REMAINING, 1.0),
    (Metric::InputFrequency, INPUT_FREQUENCY, 10.0),
    (Metric::InputVoltage, INPUT_VOLTAGE, 10.0),
    (Metric::OutputFrequency, OUTPUT_FREQUENCY, 10.0),
    (Metric::OutputVoltage, OUTPUT_VOLTAGE, 10.0),
    (Metric::LoadLevel, LOAD_LEVEL, 1.0),
    (Metric::OutputCurrent, OUTPUT_CURRENT, 10.0),
];

const PERCENTAGES: [Metric; 2] = [Metric::BatteryCapacity, Metric::LoadLevel];

#[derive(Debug, thiserror::Error)]
pub enum UPSError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("status page has {found} lines, expected at least {expected}")]
    Truncated { found: usize, expected: usize },
    #[error("status page reports no operating mode")]
    NoMode,
    #[error("cannot parse {metric} value `{raw}`: not a number")]
    NotNumeric { metric: &'static str, raw: String },
    #[error("{metric} value {value} is outside 0-100")]
    OutOfRange { metric: &'static str, value: i64 },
    #[error("cannot parse {metric} value `{raw}`: {source}")]
    ParseInt {
        metric: &'static str,
        raw: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn status_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, STATUS_PATH)
    }
}

pub struct UPS {
    client: reqwest::blocking::Client,
    endpoint: Endpoint,
}

impl UPS {
    pub fn new(endpoint: Endpoint) -> Result<UPS, UPSError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(endpoint.timeout)
            .build()?;

        Ok(UPS { client, endpoint })
    }

    /// Fetches the status page once. Failures are not retried, the
    /// monitoring system schedules the next attempt.
    pub fn get_ups_status(&self) -> Result<Readings, UPSError> {
        let url = self.endpoint.status_url();
        tracing::debug!("Querying {}", url);

        let body = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .text()?;

        let readings = parse_status(&body)?;
        tracing::debug!(
            "Parsed {} readings, mode {:?}",
            readings.len(),
            readings.state.mode
        );
        Ok(readings)
    }
}

/// Parses the body of the status page.
///
/// A field that holds `-` or nothing is left out of the readings.
pub fn parse_status(body: &str) -> Result<Readings, UPSError> {
    let res: Vec<&str> = body.lines().map(str::trim).collect();

    let needed = OUTPUT_CURRENT + 1;
    if res.len() < needed {
        return Err(UPSError::Truncated {
            found: res.len(),
            expected: needed,
        });
    }
    if res.len() != EXPECTED_LINES {
        tracing::debug!(
            "Status page has {} lines instead of {}",
            res.len(),
            EXPECTED_LINES
        );
    }

    if res[MODE].is_empty() {
        return Err(UPSError::NoMode);
    }
    let text = |raw: &str| (!raw.is_empty()).then(|| raw.to_string());
    let state = DeviceState {
        mode: res[MODE].to_string(),
        fault: text(res[FAULT_TYPE]),
        warning: text(res[UPS_WARNING]),
    };

    let mut readings = Readings::new().with_state(state);
    for (metric, index, scale) in NUMERIC_FIELDS {
        let raw = res[index];
        if raw.is_empty() || raw.contains('-') {
            tracing::debug!("{} not reported: {:?}", metric.key(), raw);
            continue;
        }

        // The firmware only sends unsigned decimal integers.
        if !raw.bytes().all(|c| c.is_ascii_digit()) {
            return Err(UPSError::NotNumeric {
                metric: metric.key(),
                raw: raw.to_string(),
            });
        }
        let value: i64 = raw.parse().map_err(|source| UPSError::ParseInt {
            metric: metric.key(),
            raw: raw.to_string(),
            source,
        })?;
        if PERCENTAGES.contains(&metric) && value > 100 {
            return Err(UPSError::OutOfRange {
                metric: metric.key(),
                value,
            });
        }
        readings.insert(metric, value as f64 / scale);
    }

    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;

    // A healthy OLHV2K0 running from utility power.
    fn sample() -> Vec<String> {
        let mut lines = vec!["0".to_string(); EXPECTED_LINES];
        lines[MODE] = "Line Mode".to_string();
        lines[UPS_TEMP] = "200".to_string();
        lines[FAULT_TYPE] = String::new();
        lines[UPS_WARNING] = String::new();
        lines[BATTERY_VOLTAGE] = "820".to_string();
        lines[BATTERY_CAPACITY] = "100".to_string();
        lines[BATTERY_REMAINING] = "287".to_string();
        lines[INPUT_FREQUENCY] = "500".to_string();
        lines[INPUT_VOLTAGE] = "2352".to_string();
        lines[OUTPUT_FREQUENCY] = "500".to_string();
        lines[OUTPUT_VOLTAGE] = "2295".to_string();
        lines[LOAD_LEVEL] = "14".to_string();
        lines[OUTPUT_CURRENT] = "6".to_string();
        lines
    }

    #[test]
    fn test_parse_status() {
        let readings = parse_status(&sample().join("\n")).unwrap();
        assert_eq!(readings.state, DeviceState::default());
        assert_eq!(readings.len(), 10);
        assert_eq!(readings.get(Metric::InputVoltage), Some(235.2));
        assert_eq!(readings.get(Metric::OutputVoltage), Some(229.5));
        assert_eq!(readings.get(Metric::InputFrequency), Some(50.0));
        assert_eq!(readings.get(Metric::OutputCurrent), Some(0.6));
        assert_eq!(readings.get(Metric::Temperature), Some(20.0));
        assert_eq!(readings.get(Metric::BatteryVoltage), Some(82.0));
        assert_eq!(readings.get(Metric::BatteryCapacity), Some(100.0));
        assert_eq!(readings.get(Metric::BatteryRemainingTime), Some(287.0));
        assert_eq!(readings.get(Metric::LoadLevel), Some(14.0));
    }

    #[test]
    fn test_parse_crlf_and_trailing_lines() {
        let mut lines = sample();
        lines.push("1234".to_string());
        let readings = parse_status(&lines.join("\r\n")).unwrap();
        assert_eq!(readings.get(Metric::InputVoltage), Some(235.2));
    }

    #[test]
    fn test_unreported_temperature_is_absent() {
        let mut lines = sample();
        lines[UPS_TEMP] = "---.-".to_string();
        let readings = parse_status(&lines.join("\n")).unwrap();
        assert_eq!(readings.get(Metric::Temperature), None);
        assert_eq!(readings.len(), 9);
    }

    #[test]
    fn test_device_state() {
        let mut lines = sample();
        lines[MODE] = "Battery Mode".to_string();
        lines[FAULT_TYPE] = "Inverter fault".to_string();
        let readings = parse_status(&lines.join("\n")).unwrap();
        assert_eq!(readings.state.mode, "Battery Mode");
        assert_eq!(readings.state.fault.as_deref(), Some("Inverter fault"));
        assert_eq!(readings.state.warning, None);
    }

    #[test]
    fn test_malformed_status() {
        assert!(matches!(
            parse_status("Line Mode\n200\n"),
            Err(UPSError::Truncated { found: 2, .. })
        ));

        let mut lines = sample();
        lines[MODE] = String::new();
        assert!(matches!(
            parse_status(&lines.join("\n")),
            Err(UPSError::NoMode)
        ));

        let mut lines = sample();
        lines[LOAD_LEVEL] = "fourteen".to_string();
        let err = parse_status(&lines.join("\n")).unwrap_err();
        assert!(err.to_string().starts_with("cannot parse load_level value `fourteen`"));
    }

    #[test]
    fn test_percentages_are_bounded() {
        let mut lines = sample();
        lines[LOAD_LEVEL] = "100".to_string();
        lines[BATTERY_CAPACITY] = "0".to_string();
        let readings = parse_status(&lines.join("\n")).unwrap();
        assert_eq!(readings.get(Metric::LoadLevel), Some(100.0));
        assert_eq!(readings.get(Metric::BatteryCapacity), Some(0.0));

        let mut lines = sample();
        lines[BATTERY_CAPACITY] = "140".to_string();
        let err = parse_status(&lines.join("\n")).unwrap_err();
        assert!(matches!(
            err,
            UPSError::OutOfRange {
                metric: "battery_capacity",
                value: 140
            }
        ));
        assert_eq!(err.to_string(), "battery_capacity value 140 is outside 0-100");
    }

    #[test]
    fn test_signed_values_are_rejected() {
        let mut lines = sample();
        lines[INPUT_VOLTAGE] = "+2352".to_string();
        assert!(matches!(
            parse_status(&lines.join("\n")),
            Err(UPSError::NotNumeric {
                metric: "input_voltage",
                ..
            })
        ));
    }

    #[test]
    fn test_status_url() {
        let endpoint = Endpoint {
            host: "10.1.2.3".to_string(),
            port: 8080,
            timeout: Duration::from_secs(1),
        };
        assert_eq!(
            endpoint.status_url(),
            "http://10.1.2.3:8080/cgi-bin/realInfo.cgi"
        );
    }
}
