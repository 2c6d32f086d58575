//! Simulated telemetry source.
//!
//! Produces random-walk readings around each sensor's normal range, so the
//! poller and its consumers can be exercised without a gateway.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gaswatch_adapters::{FetchError, TelemetrySource};
use gaswatch_types::{ProfileTable, Reading, SensorId};

/// A source that generates plausible readings.
///
/// Each sensor starts at 60% of its Good boundary and drifts by up to 5% of
/// its Warning boundary per fetch, never going below zero.
#[derive(Debug)]
pub struct SimulatedSource {
    profiles: Arc<ProfileTable>,
    state: Mutex<WalkState>,
    failure_rate: f64,
}

#[derive(Debug)]
struct WalkState {
    rng: StdRng,
    values: [f64; SensorId::COUNT],
}

impl SimulatedSource {
    /// Create a simulated source seeded from system entropy.
    pub fn new(profiles: Arc<ProfileTable>) -> Self {
        Self::with_rng(profiles, StdRng::from_entropy())
    }

    /// Create a deterministic simulated source.
    pub fn with_seed(profiles: Arc<ProfileTable>, seed: u64) -> Self {
        Self::with_rng(profiles, StdRng::seed_from_u64(seed))
    }

    fn with_rng(profiles: Arc<ProfileTable>, rng: StdRng) -> Self {
        let values = SensorId::ALL.map(|s| profiles.get(s).thresholds.good() * 0.6);
        Self {
            profiles,
            state: Mutex::new(WalkState { rng, values }),
            failure_rate: 0.0,
        }
    }

    /// Make a fraction of fetches fail with a transport error (0.0 to 1.0).
    pub fn failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }
}

#[async_trait]
impl TelemetrySource for SimulatedSource {
    async fn fetch(&self) -> Result<Reading, FetchError> {
        let mut state = self.state.lock();

        if self.failure_rate > 0.0 && state.rng.gen_bool(self.failure_rate) {
            return Err(FetchError::transport("simulated gateway timeout"));
        }

        for sensor in SensorId::ALL {
            let step = (self.profiles.get(sensor).thresholds.warning() * 0.05).abs();
            let delta = state.rng.gen_range(-step..=step);
            let value = &mut state.values[sensor.index()];
            *value = (*value + delta).max(0.0);
        }

        // Round to one decimal place, like the gateway firmware reports.
        let values = state.values.map(|v| (v * 10.0).round() / 10.0);
        Ok(Reading::received_now(values))
    }

    fn description(&self) -> &str {
        "simulated"
    }
}
