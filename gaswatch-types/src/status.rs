//! Threshold classification.

use core::fmt;

/// Health classification of a sensor value.
///
/// Ordered by severity, so the worst of several statuses is their `max()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Status {
    Good,
    Warning,
    Danger,
}

impl Status {
    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Good => "Good",
            Status::Warning => "Moderate",
            Status::Danger => "Poor",
        }
    }

    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Good => "OK",
            Status::Warning => "WARN",
            Status::Danger => "DANGER",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Danger thresholds for one sensor.
///
/// Always finite and strictly increasing: `good < warning < danger`.
/// Only `good` and `warning` decide a [`Status`]; `danger` describes the
/// top of the scale and is carried for display.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Thresholds {
    pub(crate) good: f64,
    pub(crate) warning: f64,
    pub(crate) danger: f64,
}

impl Thresholds {
    /// Create validated thresholds.
    pub fn new(good: f64, warning: f64, danger: f64) -> Result<Self, ThresholdError> {
        if !(good.is_finite() && warning.is_finite() && danger.is_finite()) {
            return Err(ThresholdError::NotFinite);
        }
        if !(good < warning && warning < danger) {
            return Err(ThresholdError::NotIncreasing {
                good,
                warning,
                danger,
            });
        }
        Ok(Self {
            good,
            warning,
            danger,
        })
    }

    /// Upper bound (inclusive) of the Good band.
    pub fn good(&self) -> f64 {
        self.good
    }

    /// Upper bound (inclusive) of the Warning band.
    pub fn warning(&self) -> f64 {
        self.warning
    }

    /// Descriptive danger level. Not used by [`classify`].
    pub fn danger(&self) -> f64 {
        self.danger
    }
}

/// Reasons a threshold triple is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdError {
    /// One of the values is NaN or infinite.
    NotFinite,
    /// The values are not strictly increasing.
    NotIncreasing { good: f64, warning: f64, danger: f64 },
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdError::NotFinite => f.write_str("thresholds must be finite numbers"),
            ThresholdError::NotIncreasing {
                good,
                warning,
                danger,
            } => write!(
                f,
                "thresholds must satisfy good < warning < danger (got {} / {} / {})",
                good, warning, danger
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ThresholdError {}

/// Classify a value against a threshold set.
///
/// `value <= good` is Good, `value <= warning` is Warning, anything above is
/// Danger. Non-finite values (NaN, infinities) classify as Danger.
pub fn classify(value: f64, thresholds: &Thresholds) -> Status {
    if !value.is_finite() {
        return Status::Danger;
    }
    if value <= thresholds.good {
        Status::Good
    } else if value <= thresholds.warning {
        Status::Warning
    } else {
        Status::Danger
    }
}
