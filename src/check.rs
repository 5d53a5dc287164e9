//! Threshold evaluation of a set of readings.
//!
//! Each thresholded metric is checked against its critical range first and its
//! warning range second. The worst verdict decides the overall severity, and
//! every non-OK verdict contributes one description to the summary.

use std::collections::HashMap;
use std::fmt;

use crate::nagios::Severity;
use crate::range::{Breach, RangeError, RangeSpec};
use crate::status::{DeviceState, Metric, Readings};

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("invalid {level} threshold for --{option}: {source}")]
    Threshold {
        option: String,
        level: &'static str,
        #[source]
        source: RangeError,
    },
    #[error("could not determine {}", .0.key())]
    MissingMetric(Metric),
}

/// Warning and critical ranges of one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Thresholds {
    pub warning: RangeSpec,
    pub critical: RangeSpec,
}

impl Thresholds {
    /// Parses a raw pair, naming `metric` in the error.
    pub fn parse(
        metric: Metric,
        warning: Option<&str>,
        critical: Option<&str>,
    ) -> Result<Thresholds, CheckError> {
        let wrap = |level: &'static str| {
            move |source: RangeError| CheckError::Threshold {
                option: metric
                    .threshold_key()
                    .unwrap_or_else(|| metric.key())
                    .replace('_', "-"),
                level,
                source,
            }
        };

        Ok(Thresholds {
            warning: RangeSpec::parse_optional(warning).map_err(wrap("warning"))?,
            critical: RangeSpec::parse_optional(critical).map_err(wrap("critical"))?,
        })
    }
}

/// Thresholds for every metric, built once before the ups is queried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckConfig {
    thresholds: HashMap<Metric, Thresholds>,
}

impl CheckConfig {
    pub fn new() -> CheckConfig {
        CheckConfig::default()
    }

    pub fn with(mut self, metric: Metric, thresholds: Thresholds) -> CheckConfig {
        self.thresholds.insert(metric, thresholds);
        self
    }

    /// Unconfigured metrics get ranges that never alert.
    pub fn thresholds(&self, metric: Metric) -> Thresholds {
        self.thresholds.get(&metric).copied().unwrap_or_default()
    }
}

/// Outcome of checking a single metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub severity: Severity,
    pub description: Option<String>,
}

impl Verdict {
    fn ok() -> Verdict {
        Verdict {
            severity: Severity::Ok,
            description: None,
        }
    }
}

/// A measured value paired with its thresholds.
#[derive(Debug, Clone, Copy)]
pub struct MetricCheck {
    pub metric: Metric,
    pub value: f64,
    pub thresholds: Thresholds,
}

impl MetricCheck {
    pub fn check(&self) -> Verdict {
        let levels = [
            (Severity::Critical, &self.thresholds.critical),
            (Severity::Warning, &self.thresholds.warning),
        ];
        for (severity, range) in levels {
            if range.evaluate(self.value) {
                return Verdict {
                    severity,
                    description: Some(self.describe(range)),
                };
            }
        }

        Verdict::ok()
    }

    fn describe(&self, range: &RangeSpec) -> String {
        let value = self.metric.format_value(self.value);
        let label = self.metric.label();
        match range.breach(self.value) {
            Some(Breach::Above(bound)) => format!("{}: {}>={:?}", label, value, bound),
            Some(Breach::Below(bound)) => format!("{}: {}<={:?}", label, value, bound),
            Some(Breach::Inside) | None => {
                let range = range.to_string();
                format!("{}: {} in {}", label, value, range.trim_start_matches('@'))
            }
        }
    }
}

/// One `name=value<unit>` entry of the performance data.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfEntry {
    pub metric: Metric,
    pub value: f64,
}

impl fmt::Display for PerfEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}={}{}",
            self.metric.perf_name(),
            self.metric.format_value(self.value),
            self.metric.unit()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub severity: Severity,
    pub summary: String,
    pub perfdata: Vec<PerfEntry>,
}

impl AggregateResult {
    /// The human readable part, e.g. `CRITICAL: Temp C: 20.0>=19.0`.
    pub fn message(&self) -> String {
        format!("{}: {}", self.severity, self.summary)
    }

    pub fn perfdata_line(&self) -> String {
        self.perfdata
            .iter()
            .map(PerfEntry::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AggregateResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} | {}", self.message(), self.perfdata_line())
    }
}

pub struct Evaluator<'a> {
    config: &'a CheckConfig,
}

impl<'a> Evaluator<'a> {
    pub fn new(config: &'a CheckConfig) -> Evaluator<'a> {
        Evaluator { config }
    }

    pub fn evaluate(&self, readings: &Readings) -> Result<AggregateResult, CheckError> {
        // Nothing is reported unless every metric is present.
        let value = |metric: Metric| {
            readings
                .get(metric)
                .ok_or(CheckError::MissingMetric(metric))
        };
        let perfdata = Metric::PERFDATA
            .iter()
            .map(|&metric| value(metric).map(|value| PerfEntry { metric, value }))
            .collect::<Result<Vec<_>, CheckError>>()?;

        let mut severity = Severity::Ok;
        let mut reasons: Vec<String> = Vec::new();

        let state = &readings.state;
        let state_reasons = [
            state.fault.as_ref().map(|fault| format!("UPS fault: {}", fault)),
            state.warning.as_ref().map(|warning| format!("Warning: {}", warning)),
            (state.mode != DeviceState::LINE_MODE)
                .then(|| format!("UPS mode: {}", state.mode)),
        ];
        for reason in state_reasons.into_iter().flatten() {
            severity = severity.max(Severity::Warning);
            reasons.push(reason);
        }

        for metric in Metric::THRESHOLDED {
            let verdict = MetricCheck {
                metric,
                value: value(metric)?,
                thresholds: self.config.thresholds(metric),
            }
            .check();

            if verdict.severity != Severity::Ok {
                tracing::debug!(
                    "{:?} is {}: {:?}",
                    metric,
                    verdict.severity,
                    verdict.description
                );
            }
            severity = severity.max(verdict.severity);
            reasons.extend(verdict.description);
        }

        let summary = if severity == Severity::Ok {
            format!(
                "UPS is doing fine: in: {}V, {}Hz, load: {}%, remaining: {}min, temp: {}°C",
                Metric::InputVoltage.format_value(value(Metric::InputVoltage)?),
                Metric::InputFrequency.format_value(value(Metric::InputFrequency)?),
                Metric::LoadLevel.format_value(value(Metric::LoadLevel)?),
                Metric::BatteryRemainingTime.format_value(value(Metric::BatteryRemainingTime)?),
                Metric::Temperature.format_value(value(Metric::Temperature)?),
            )
        } else {
            reasons.join(", ")
        };

        Ok(AggregateResult {
            severity,
            summary,
            perfdata,
        })
    }
}
