//! Nagios threshold ranges, see
//! <https://nagios-plugins.org/doc/guidelines.html#THRESHOLDFORMAT>.
//!
//! A range is written `[@]start:end`. Values outside `[start, end]` raise an
//! alert, or values inside it when the range starts with `@`. A missing
//! `start:` means `0:`, an empty or `~` start is negative infinity and an
//! empty end is positive infinity.

use std::fmt;

const INVERT_MARKER: char = '@';
const SEPARATOR: char = ':';
const NEGATIVE_INFINITY: &str = "~";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RangeError {
    #[error("`{0}` has no range after the @ marker")]
    MissingBody(String),
    #[error("cannot parse `{token}` in `{text}` as a number")]
    InvalidNumber { text: String, token: String },
    #[error("lower bound {lower:?} is above upper bound {upper:?} in `{text}`")]
    Reversed { text: String, lower: f64, upper: f64 },
}

/// Which side of a range a value broke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Breach {
    Below(f64),
    Above(f64),
    Inside,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSpec {
    lower: f64,
    upper: f64,
    invert: bool,
}

impl Default for RangeSpec {
    fn default() -> Self {
        RangeSpec::unbounded()
    }
}

impl RangeSpec {
    /// A range that never alerts.
    pub fn unbounded() -> RangeSpec {
        RangeSpec {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
            invert: false,
        }
    }

    /// Parses an optional range, treating an absent one like an empty one.
    pub fn parse_optional(text: Option<&str>) -> Result<RangeSpec, RangeError> {
        text.map_or_else(|| Ok(RangeSpec::unbounded()), RangeSpec::parse)
    }

    pub fn parse(text: &str) -> Result<RangeSpec, RangeError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(RangeSpec::unbounded());
        }

        let (invert, body) = match trimmed.strip_prefix(INVERT_MARKER) {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };
        if body.is_empty() {
            return Err(RangeError::MissingBody(trimmed.to_string()));
        }

        let (lower, upper) = match body.split_once(SEPARATOR) {
            // A bare number is an upper bound with the lower bound pinned at zero.
            None => (0.0, parse_bound(trimmed, body)?),
            Some((start, end)) => {
                let start = start.trim();
                let end = end.trim();
                let lower = if start.is_empty() || start == NEGATIVE_INFINITY {
                    f64::NEG_INFINITY
                } else {
                    parse_bound(trimmed, start)?
                };
                let upper = if end.is_empty() {
                    f64::INFINITY
                } else {
                    parse_bound(trimmed, end)?
                };
                (lower, upper)
            }
        };

        if lower > upper {
            return Err(RangeError::Reversed {
                text: trimmed.to_string(),
                lower,
                upper,
            });
        }

        Ok(RangeSpec {
            lower,
            upper,
            invert,
        })
    }

    fn is_unbounded(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }

    /// Returns true when `value` meets the alert condition.
    pub fn evaluate(&self, value: f64) -> bool {
        self.breach(value).is_some()
    }

    /// Like `evaluate`, but says which bound was broken.
    pub fn breach(&self, value: f64) -> Option<Breach> {
        if self.is_unbounded() {
            return None;
        }

        if self.invert {
            if self.lower <= value && value <= self.upper {
                return Some(Breach::Inside);
            }
        } else if value < self.lower {
            return Some(Breach::Below(self.lower));
        } else if value > self.upper {
            return Some(Breach::Above(self.upper));
        }

        None
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.invert {
            write!(f, "{}", INVERT_MARKER)?;
        }
        if self.lower == f64::NEG_INFINITY {
            write!(f, "{}", NEGATIVE_INFINITY)?;
        } else {
            write!(f, "{:?}", self.lower)?;
        }
        write!(f, "{}", SEPARATOR)?;
        if self.upper != f64::INFINITY {
            write!(f, "{:?}", self.upper)?;
        }
        Ok(())
    }
}

fn parse_bound(text: &str, token: &str) -> Result<f64, RangeError> {
    let invalid = || RangeError::InvalidNumber {
        text: text.to_string(),
        token: token.to_string(),
    };

    let number: f64 = token.parse().map_err(|_| invalid())?;
    // `f64::from_str` accepts "inf" and "NaN", which are not thresholds.
    if !number.is_finite() {
        return Err(invalid());
    }
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_range_alerts_outside() {
        let range = RangeSpec::parse("10:20").unwrap();
        for v in [10.0, 12.5, 20.0] {
            assert!(!range.evaluate(v), "{} should be fine", v);
        }
        for v in [9.99, 20.01, -5.0, 1e9] {
            assert!(range.evaluate(v), "{} should alert", v);
        }
    }

    #[test]
    fn test_inverted_range_is_negation() {
        let plain = RangeSpec::parse("10:20").unwrap();
        let inverted = RangeSpec::parse("@10:20").unwrap();
        assert!(inverted.invert);
        for v in [-1.0, 9.9, 10.0, 15.0, 20.0, 20.1, 100.0] {
            assert_eq!(plain.evaluate(v), !inverted.evaluate(v), "value {}", v);
        }
        assert_eq!(inverted.breach(15.0), Some(Breach::Inside));
    }

    #[test]
    fn test_empty_never_alerts() {
        for range in [
            RangeSpec::parse("").unwrap(),
            RangeSpec::parse("   ").unwrap(),
            RangeSpec::parse_optional(None).unwrap(),
            RangeSpec::parse(":").unwrap(),
            RangeSpec::parse("@~:").unwrap(),
        ] {
            for v in [f64::MIN, -1.0, 0.0, 1.0, 1e12, f64::MAX] {
                assert!(!range.evaluate(v), "{} alerted on {}", range, v);
            }
        }
    }

    #[test]
    fn test_open_ended_ranges() {
        let range = RangeSpec::parse("10:").unwrap();
        assert!(range.evaluate(9.9));
        assert!(!range.evaluate(10.0));
        assert!(!range.evaluate(1e9));
        assert_eq!(range.breach(3.0), Some(Breach::Below(10.0)));

        let range = RangeSpec::parse(":10").unwrap();
        assert!(range.evaluate(10.1));
        assert!(!range.evaluate(10.0));
        assert!(!range.evaluate(-1e9));
        assert_eq!(range.breach(11.0), Some(Breach::Above(10.0)));

        assert_eq!(
            RangeSpec::parse("~:10").unwrap(),
            RangeSpec::parse(":10").unwrap()
        );
    }

    #[test]
    fn test_bare_number_is_upper_bound_from_zero() {
        let bare = RangeSpec::parse("10").unwrap();
        assert_eq!(bare, RangeSpec::parse("0:10").unwrap());
        assert!(bare.evaluate(-0.5));
        assert!(!bare.evaluate(0.0));
        assert!(bare.evaluate(10.5));
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(
            RangeSpec::parse(" 5:15 ").unwrap(),
            RangeSpec::parse("5:15").unwrap()
        );
        assert_eq!(
            RangeSpec::parse("@ 220 : 240").unwrap(),
            RangeSpec::parse("@220:240").unwrap()
        );
    }

    #[test]
    fn test_decimal_and_negative_bounds() {
        let range = RangeSpec::parse("-10.5:49.5").unwrap();
        assert_eq!(range.lower, -10.5);
        assert_eq!(range.upper, 49.5);
        assert!(range.evaluate(-11.0));
        assert!(!range.evaluate(-10.5));
    }

    #[test]
    fn test_malformed_ranges() {
        assert!(matches!(
            RangeSpec::parse("abc:5"),
            Err(RangeError::InvalidNumber { .. })
        ));
        assert!(matches!(
            RangeSpec::parse("1:2:3"),
            Err(RangeError::InvalidNumber { .. })
        ));
        assert!(matches!(
            RangeSpec::parse("inf"),
            Err(RangeError::InvalidNumber { .. })
        ));
        assert!(matches!(
            RangeSpec::parse("@"),
            Err(RangeError::MissingBody(_))
        ));
        assert_eq!(
            RangeSpec::parse("10:5"),
            Err(RangeError::Reversed {
                text: "10:5".to_string(),
                lower: 10.0,
                upper: 5.0,
            })
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(RangeSpec::parse("@220:240").unwrap().to_string(), "@220.0:240.0");
        assert_eq!(RangeSpec::parse("10:").unwrap().to_string(), "10.0:");
        assert_eq!(RangeSpec::parse(":19").unwrap().to_string(), "~:19.0");
    }
}
