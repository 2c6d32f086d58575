//! Static per-sensor descriptors.

use alloc::string::String;

use crate::{classify, Reading, SensorId, Status, Thresholds};

/// Static descriptor for one sensor.
///
/// Profiles are built once at start-up and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SensorProfile {
    /// Which sensor this profile describes.
    pub id: SensorId,
    /// Display name (e.g., "Ammonia").
    pub name: String,
    /// One-line description of what the sensor measures.
    pub description: String,
    /// Measurement unit (e.g., "ppm").
    pub unit: String,
    /// JSON field the producer uses for this sensor's value.
    pub field: String,
    /// Presentation category tag (e.g., "air", "methane").
    pub category: String,
    /// Danger thresholds.
    pub thresholds: Thresholds,
}

impl SensorProfile {
    /// Reference profile for a sensor.
    pub fn reference(id: SensorId) -> Self {
        // Reference thresholds are constants known to be increasing.
        let (name, description, field, category, good, warning, danger) = match id {
            SensorId::Ammonia => (
                "Ammonia",
                "Measures ammonia (NH3) concentration",
                "mq137_ppm",
                "air",
                25.0,
                50.0,
                100.0,
            ),
            SensorId::Methane => (
                "Methane",
                "Measures methane and natural gas concentrations",
                "mq4_ppm",
                "methane",
                200.0,
                250.0,
                300.0,
            ),
            SensorId::CarbonMonoxide => (
                "Carbon Monoxide",
                "Measures carbon monoxide (CO) concentration",
                "mq7_ppm",
                "carbon-monoxide",
                35.0,
                100.0,
                200.0,
            ),
        };

        Self {
            id,
            name: name.into(),
            description: description.into(),
            unit: "ppm".into(),
            field: field.into(),
            category: category.into(),
            thresholds: Thresholds {
                good,
                warning,
                danger,
            },
        }
    }

    /// Classify a value against this profile's thresholds.
    pub fn classify(&self, value: f64) -> Status {
        classify(value, &self.thresholds)
    }
}

/// Immutable mapping from every [`SensorId`] to its [`SensorProfile`].
///
/// # Example
///
/// ```rust
/// use gaswatch_types::{ProfileTable, SensorId, SensorProfile, Thresholds};
///
/// let mut methane = SensorProfile::reference(SensorId::Methane);
/// methane.thresholds = Thresholds::new(100.0, 150.0, 200.0).unwrap();
///
/// let table = ProfileTable::default().with_profile(methane);
/// assert_eq!(table.get(SensorId::Methane).thresholds.good(), 100.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProfileTable {
    profiles: [SensorProfile; SensorId::COUNT],
}

impl ProfileTable {
    /// Replace the profile for `profile.id`, consuming the table.
    pub fn with_profile(mut self, profile: SensorProfile) -> Self {
        let index = profile.id.index();
        self.profiles[index] = profile;
        self
    }

    /// Profile for a sensor.
    pub fn get(&self, sensor: SensorId) -> &SensorProfile {
        &self.profiles[sensor.index()]
    }

    /// Iterate over profiles in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &SensorProfile> {
        self.profiles.iter()
    }

    /// Classify one sensor value.
    pub fn classify(&self, sensor: SensorId, value: f64) -> Status {
        self.get(sensor).classify(value)
    }

    /// Classify every value of a reading, indexed by [`SensorId::index`].
    pub fn classify_reading(&self, reading: &Reading) -> [Status; SensorId::COUNT] {
        SensorId::ALL.map(|s| self.classify(s, reading.get(s)))
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            profiles: SensorId::ALL.map(SensorProfile::reference),
        }
    }
}
