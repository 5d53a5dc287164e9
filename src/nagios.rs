//! Output side of the Nagios plugin protocol: one line on stdout and a status
//! code.

use std::fmt;
use std::process::exit;

use crate::check::{AggregateResult, CheckError};
use crate::ups::UPSError;

/// Plugin status, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    pub fn exit_code(self) -> i32 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Unknown => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// Anything that stops the check from producing a result.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error("Bad arguments (see --help): {0}")]
    Usage(String),
    #[error("Bad configuration: {0}")]
    Config(#[from] figment::Error),
    #[error("UPS status query failed: {0}")]
    Query(#[from] UPSError),
    #[error("{0}")]
    Check(CheckError),
}

impl From<CheckError> for Failure {
    fn from(err: CheckError) -> Failure {
        match err {
            // Thresholds come from the command line or its config file.
            CheckError::Threshold { .. } => Failure::Usage(err.to_string()),
            CheckError::MissingMetric(_) => Failure::Check(err),
        }
    }
}

/// Renders the plugin output line together with its status.
pub fn render(outcome: &Result<AggregateResult, Failure>) -> (Severity, String) {
    match outcome {
        Ok(result) => (result.severity, result.to_string()),
        Err(failure) => (Severity::Unknown, format!("{}: {}", Severity::Unknown, failure)),
    }
}

pub fn print_and_exit(outcome: Result<AggregateResult, Failure>) -> ! {
    let (severity, line) = render(&outcome);
    println!("{}", line);
    exit(severity.exit_code())
}
