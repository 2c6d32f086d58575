//! Runtime configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `GASWATCH_*` environment variables (nested keys joined with `__`, e.g.
//! `GASWATCH_SENSORS__METHANE__UNIT`). The binary applies command-line
//! overrides on top.
//!
//! ```toml
//! base_url = "http://127.0.0.1:8080"
//! interval = "5s"
//! retries = 3
//! history_capacity = 20
//! request_timeout = "10s"
//!
//! [sensors.ammonia]
//! field = "mq137_ppm"
//! thresholds = { good = 25.0, warning = 50.0, danger = 100.0 }
//! ```
//!
//! Sensor sections are partial: anything left out keeps the reference
//! profile's value.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use gaswatch_types::{ProfileTable, SensorId, SensorProfile, Thresholds};

use crate::data::duration::parse_duration;
use crate::poller::PollSettings;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "GASWATCH";

/// Gateway address when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// HTTP request timeout when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Validated settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Gateway base URL; readings are fetched from `<base_url>/raw`.
    pub base_url: String,
    pub request_timeout: Duration,
    pub poll: PollSettings,
    pub profiles: ProfileTable,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll: PollSettings::default(),
            profiles: ProfileTable::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    base_url: Option<String>,
    interval: Option<String>,
    retries: Option<u32>,
    history_capacity: Option<usize>,
    request_timeout: Option<String>,
    sensors: BTreeMap<String, RawSensor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSensor {
    name: Option<String>,
    description: Option<String>,
    unit: Option<String>,
    field: Option<String>,
    category: Option<String>,
    thresholds: Option<RawThresholds>,
}

#[derive(Debug, Deserialize)]
struct RawThresholds {
    good: f64,
    warning: f64,
    danger: f64,
}

impl Settings {
    /// Load settings from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?;

        let raw: RawSettings = config.try_deserialize().context("Invalid configuration")?;
        Self::from_raw(raw)
    }

    /// Load settings from a TOML string. Environment variables are ignored.
    pub fn from_toml(toml: &str) -> Result<Self> {
        let raw: RawSettings = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .context("Invalid configuration")?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(url) = raw.base_url {
            settings.base_url = url;
        }
        if let Some(interval) = raw.interval {
            settings.poll.interval =
                parse_duration(&interval).context("Invalid value for 'interval'")?;
        }
        if let Some(retries) = raw.retries {
            settings.poll.retries = retries;
        }
        if let Some(capacity) = raw.history_capacity {
            settings.poll.history_capacity = capacity;
        }
        if let Some(timeout) = raw.request_timeout {
            settings.request_timeout =
                parse_duration(&timeout).context("Invalid value for 'request_timeout'")?;
        }

        for (key, sensor) in raw.sensors {
            let id: SensorId = key
                .parse()
                .map_err(|e| anyhow!("{}", e))
                .with_context(|| format!("Invalid sensor section [sensors.{}]", key))?;
            let profile = sensor
                .apply(settings.profiles.get(id).clone())
                .with_context(|| format!("Invalid sensor section [sensors.{}]", key))?;
            settings.profiles = settings.profiles.with_profile(profile);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check invariants that individual fields cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("'base_url' must not be empty");
        }
        if self.poll.interval.is_zero() {
            bail!("'interval' must be greater than zero");
        }
        if self.poll.history_capacity == 0 {
            bail!("'history_capacity' must be at least 1");
        }
        if self.request_timeout.is_zero() {
            bail!("'request_timeout' must be greater than zero");
        }

        let mut fields: Vec<&str> = self.profiles.iter().map(|p| p.field.as_str()).collect();
        fields.sort_unstable();
        if let Some(pair) = fields.windows(2).find(|w| w[0] == w[1]) {
            bail!("Sensor field '{}' is used by more than one sensor", pair[0]);
        }
        if let Some(p) = self.profiles.iter().find(|p| p.field.is_empty()) {
            bail!("Sensor '{}' has an empty field name", p.id);
        }

        Ok(())
    }
}

impl RawSensor {
    fn apply(self, mut profile: SensorProfile) -> Result<SensorProfile> {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(description) = self.description {
            profile.description = description;
        }
        if let Some(unit) = self.unit {
            profile.unit = unit;
        }
        if let Some(field) = self.field {
            profile.field = field;
        }
        if let Some(category) = self.category {
            profile.category = category;
        }
        if let Some(t) = self.thresholds {
            profile.thresholds = Thresholds::new(t.good, t.warning, t.danger)?;
        }
        Ok(profile)
    }
}
