//! Nagios check for Online USV ups units (www.online-usv.de).
//!
//! Reads the status page of the ups web interface once, compares the readings
//! against Nagios-style warning/critical ranges and prints a single status
//! line with performance data.
//!
//! ```plain
//! $ check_ups -H 10.1.2.3 --temp-celsius 5:15 :19 --battery-remaining 500: 100:
//! CRITICAL: Temp C: 20.0>=19.0, Batt Remain: 287<=500.0 | input_voltage=235.2V, ...
//! ```
//!
//! Options may also be set in a TOML file (`ups-check.toml` by default):
//!
//! ```toml
//! host = "10.1.2.3"
//! port = 80
//! timeout_secs = 1
//!
//! [thresholds.temp_celsius]
//! warning = "5:30"
//! critical = ":40"
//! ```
//!
//! Logs go to stderr and are tuned with `RUST_LOG` or `-v`.

mod check;
mod nagios;
mod range;
mod settings;
mod status;
mod ups;

use std::path::PathBuf;

use clap::{ErrorKind, Parser};
use tracing_subscriber::EnvFilter;

use check::{AggregateResult, Evaluator};
use nagios::Failure;
use settings::{Overrides, Settings, ThresholdPair, ThresholdSettings};

const CONFIG_FILE: &str = "ups-check.toml";

#[derive(Parser, Debug)]
#[clap(name = "check_ups", version, about = "Nagios check for Online USV ups units")]
struct Cli {
    /// IP address or hostname of the UPS
    #[clap(short = 'H', long, value_name = "ADDRESS")]
    host: Option<String>,

    /// Port of the UPS HTTP interface [default: 80]
    #[clap(short = 'P', long)]
    port: Option<u16>,

    /// Seconds to wait for the status page [default: 1]
    #[clap(short, long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// TOML file with defaults for every option
    #[clap(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Log debug output to stderr
    #[clap(short, long)]
    verbose: bool,

    /// Warning/critical ranges for input voltage, e.g. 225:245 220:250
    #[clap(long, number_of_values = 2, value_names = &["WARN", "CRIT"], allow_hyphen_values = true)]
    input_voltage: Option<Vec<String>>,

    /// Warning/critical ranges for output voltage, e.g. 225:235 220:240
    #[clap(long, number_of_values = 2, value_names = &["WARN", "CRIT"], allow_hyphen_values = true)]
    output_voltage: Option<Vec<String>>,

    /// Warning/critical ranges for input frequency, e.g. 48:52 46:54
    #[clap(long, number_of_values = 2, value_names = &["WARN", "CRIT"], allow_hyphen_values = true)]
    input_frequency: Option<Vec<String>>,

    /// Warning/critical ranges for output frequency, e.g. 48:52 46:54
    #[clap(long, number_of_values = 2, value_names = &["WARN", "CRIT"], allow_hyphen_values = true)]
    output_frequency: Option<Vec<String>>,

    /// Warning/critical ranges for load level (0-100), e.g. :20 :50
    #[clap(long, number_of_values = 2, value_names = &["WARN", "CRIT"], allow_hyphen_values = true)]
    load_level: Option<Vec<String>>,

    /// Warning/critical ranges for temperature in celsius degrees, e.g. 5:30 :40
    #[clap(long, number_of_values = 2, value_names = &["WARN", "CRIT"], allow_hyphen_values = true)]
    temp_celsius: Option<Vec<String>>,

    /// Warning/critical ranges for battery capacity (0-100), e.g. 50: 25:
    #[clap(long, number_of_values = 2, value_names = &["WARN", "CRIT"], allow_hyphen_values = true)]
    battery_capacity: Option<Vec<String>>,

    /// Warning/critical ranges for battery remaining time in minutes, e.g. 60: 30:
    #[clap(long, number_of_values = 2, value_names = &["WARN", "CRIT"], allow_hyphen_values = true)]
    battery_remaining: Option<Vec<String>>,
}

/// The last pair given for an option wins.
fn threshold_pair(values: &Option<Vec<String>>) -> Option<ThresholdPair> {
    values
        .as_ref()?
        .chunks_exact(2)
        .last()
        .map(|pair| ThresholdPair::new(&pair[0], &pair[1]))
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            timeout_secs: self.timeout,
            thresholds: ThresholdSettings {
                input_voltage: threshold_pair(&self.input_voltage),
                output_voltage: threshold_pair(&self.output_voltage),
                input_frequency: threshold_pair(&self.input_frequency),
                output_frequency: threshold_pair(&self.output_frequency),
                load_level: threshold_pair(&self.load_level),
                temp_celsius: threshold_pair(&self.temp_celsius),
                battery_capacity: threshold_pair(&self.battery_capacity),
                battery_remaining: threshold_pair(&self.battery_remaining),
            },
        }
    }
}

/// Filter used when `RUST_LOG` is not set. Events are targeted at the
/// binary's crate name, not the package name.
fn log_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    format!("{}={}", env!("CARGO_CRATE_NAME"), level)
}

fn init_logging(verbose: bool) {
    let default = log_directive(verbose);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}

fn run(cli: &Cli) -> Result<AggregateResult, Failure> {
    let settings = Settings::load(&cli.config, &cli.overrides())?;
    tracing::debug!("{:#?}", settings);

    // Bad ranges are reported before the ups is contacted.
    let config = settings.check_config()?;
    let endpoint = settings.endpoint()?;

    let ups = ups::UPS::new(endpoint)?;
    let readings = ups.get_ups_status()?;

    Ok(Evaluator::new(&config).evaluate(&readings)?)
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let message = e.to_string();
            let first_line = message.lines().next().unwrap_or_default();
            nagios::print_and_exit(Err(Failure::Usage(
                first_line.trim_start_matches("error: ").to_string(),
            )))
        }
    };

    init_logging(cli.verbose);

    let outcome = run(&cli);
    if let Err(e) = &outcome {
        tracing::debug!("Check failed: {:?}", e);
    }
    nagios::print_and_exit(outcome)
}
