//! Sensor identifiers.

use core::fmt;
use core::str::FromStr;

/// One of the gas sensors known to the system.
///
/// The set is closed: every [`Reading`](crate::Reading) carries exactly one
/// value for each variant, in the order of [`SensorId::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SensorId {
    /// Ammonia (NH3), MQ-137.
    Ammonia,
    /// Methane (CH4), MQ-4.
    Methane,
    /// Carbon monoxide (CO), MQ-7.
    CarbonMonoxide,
}

impl SensorId {
    /// Number of known sensors.
    pub const COUNT: usize = 3;

    /// All sensors in canonical order.
    pub const ALL: [SensorId; Self::COUNT] = [
        SensorId::Ammonia,
        SensorId::Methane,
        SensorId::CarbonMonoxide,
    ];

    /// Position of this sensor in per-sensor arrays.
    pub const fn index(self) -> usize {
        match self {
            SensorId::Ammonia => 0,
            SensorId::Methane => 1,
            SensorId::CarbonMonoxide => 2,
        }
    }

    /// Stable snake_case key, used in configuration and JSON output.
    pub const fn key(self) -> &'static str {
        match self {
            SensorId::Ammonia => "ammonia",
            SensorId::Methane => "methane",
            SensorId::CarbonMonoxide => "carbon_monoxide",
        }
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when parsing an unknown sensor key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSensor(pub alloc::string::String);

impl fmt::Display for UnknownSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sensor '{}'", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownSensor {}

impl FromStr for SensorId {
    type Err = UnknownSensor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ammonia" | "nh3" => Ok(SensorId::Ammonia),
            "methane" | "ch4" => Ok(SensorId::Methane),
            "carbon_monoxide" | "carbon-monoxide" | "co" => Ok(SensorId::CarbonMonoxide),
            other => Err(UnknownSensor(other.into())),
        }
    }
}
