use std::collections::HashMap;

/// Every reading the check knows about.
///
/// Variants are declared in the order breaches are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    InputVoltage,
    OutputVoltage,
    InputFrequency,
    OutputFrequency,
    LoadLevel,
    Temperature,
    BatteryCapacity,
    BatteryRemainingTime,
    // Informational only, never thresholded.
    OutputCurrent,
    BatteryVoltage,
}

/// How a reading is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Whole,
    Tenths,
}

impl Metric {
    /// Metrics that take warning/critical thresholds, in report order.
    pub const THRESHOLDED: [Metric; 8] = [
        Metric::InputVoltage,
        Metric::OutputVoltage,
        Metric::InputFrequency,
        Metric::OutputFrequency,
        Metric::LoadLevel,
        Metric::Temperature,
        Metric::BatteryCapacity,
        Metric::BatteryRemainingTime,
    ];

    /// Every metric, in performance data order.
    pub const PERFDATA: [Metric; 10] = [
        Metric::InputVoltage,
        Metric::OutputVoltage,
        Metric::InputFrequency,
        Metric::OutputFrequency,
        Metric::OutputCurrent,
        Metric::BatteryCapacity,
        Metric::BatteryRemainingTime,
        Metric::BatteryVoltage,
        Metric::LoadLevel,
        Metric::Temperature,
    ];

    /// Name of the reading as supplied by the device.
    pub fn key(self) -> &'static str {
        match self {
            Metric::InputVoltage => "input_voltage",
            Metric::OutputVoltage => "output_voltage",
            Metric::InputFrequency => "input_frequency",
            Metric::OutputFrequency => "output_frequency",
            Metric::LoadLevel => "load_level",
            Metric::Temperature => "temperature",
            Metric::BatteryCapacity => "battery_capacity",
            Metric::BatteryRemainingTime => "battery_remaining_time",
            Metric::OutputCurrent => "output_current",
            Metric::BatteryVoltage => "battery_voltage",
        }
    }

    /// Label used in the performance data.
    pub fn perf_name(self) -> &'static str {
        match self {
            Metric::Temperature => "temp_celsius",
            other => other.key(),
        }
    }

    /// Key of the threshold pair in the configuration, `None` if the metric
    /// cannot be thresholded.
    pub fn threshold_key(self) -> Option<&'static str> {
        match self {
            Metric::InputVoltage => Some("input_voltage"),
            Metric::OutputVoltage => Some("output_voltage"),
            Metric::InputFrequency => Some("input_frequency"),
            Metric::OutputFrequency => Some("output_frequency"),
            Metric::LoadLevel => Some("load_level"),
            Metric::Temperature => Some("temp_celsius"),
            Metric::BatteryCapacity => Some("battery_capacity"),
            Metric::BatteryRemainingTime => Some("battery_remaining"),
            Metric::OutputCurrent | Metric::BatteryVoltage => None,
        }
    }

    /// Short label prefixed to a breach description.
    pub fn label(self) -> &'static str {
        match self {
            Metric::InputVoltage => "Input Volt",
            Metric::OutputVoltage => "Output Volt",
            Metric::InputFrequency => "Input Freq",
            Metric::OutputFrequency => "Output Freq",
            Metric::LoadLevel => "Load Level",
            Metric::Temperature => "Temp C",
            Metric::BatteryCapacity => "Batt Cap",
            Metric::BatteryRemainingTime => "Batt Remain",
            // Never shown, these two are not thresholded.
            Metric::OutputCurrent => "Output Curr",
            Metric::BatteryVoltage => "Batt Volt",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::InputVoltage | Metric::OutputVoltage | Metric::BatteryVoltage => "V",
            Metric::InputFrequency | Metric::OutputFrequency => "Hz",
            Metric::LoadLevel | Metric::BatteryCapacity => "%",
            Metric::BatteryRemainingTime => "min",
            Metric::Temperature => "°C",
            Metric::OutputCurrent => "A",
        }
    }

    pub fn precision(self) -> Precision {
        match self {
            Metric::LoadLevel | Metric::BatteryCapacity | Metric::BatteryRemainingTime => {
                Precision::Whole
            }
            _ => Precision::Tenths,
        }
    }

    /// Formats a value of this metric without its unit.
    pub fn format_value(self, value: f64) -> String {
        match self.precision() {
            Precision::Whole => format!("{:.0}", value),
            Precision::Tenths => format!("{:.1}", value),
        }
    }
}

/// Operating state reported next to the numeric readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub mode: String,
    pub fault: Option<String>,
    pub warning: Option<String>,
}

impl DeviceState {
    /// The mode of a healthy unit running from utility power.
    pub const LINE_MODE: &'static str = "Line Mode";
}

impl Default for DeviceState {
    fn default() -> Self {
        DeviceState {
            mode: DeviceState::LINE_MODE.to_string(),
            fault: None,
            warning: None,
        }
    }
}

/// One snapshot of the ups, as handed to the evaluator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readings {
    values: HashMap<Metric, f64>,
    pub state: DeviceState,
}

impl Readings {
    pub fn new() -> Readings {
        Readings::default()
    }

    pub fn with_state(mut self, state: DeviceState) -> Readings {
        self.state = state;
        self
    }

    pub fn insert(&mut self, metric: Metric, value: f64) {
        self.values.insert(metric, value);
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
