//! Periodic polling of a telemetry source.
//!
//! A [`Poller`] owns one background task. The task runs a poll cycle
//! immediately on [`start`](Poller::start), then once per interval and on
//! every [`refresh_now`](Poller::refresh_now). Cycles never overlap: a
//! refresh requested while a cycle is in flight is queued behind it, and
//! any number of such requests collapse into one follow-up cycle.
//!
//! A cycle makes one fetch attempt plus up to `retries` immediate retries.
//! On success the reading is classified, appended to the history and
//! becomes current; on failure only the error is recorded, so the last good
//! reading and the history stay visible.
//!
//! [`stop`](Poller::stop) is terminal. A fetch that is in flight when the
//! poller stops is allowed to finish, but its result is discarded.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gaswatch::{HttpSource, PollSettings, Poller};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let source = HttpSource::builder().endpoint("http://gateway.local").build()?;
//! let poller = Poller::new(Arc::new(source), Arc::default(), PollSettings::default());
//!
//! let mut updates = poller.subscribe();
//! poller.start()?;
//! while updates.changed().await.is_ok() {
//!     let state = updates.borrow_and_update().clone();
//!     println!("{} readings, loading: {}", state.history.len(), state.is_loading);
//! }
//! # Ok(())
//! # }
//! ```

mod state;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use gaswatch_adapters::{FetchError, TelemetrySource};
use gaswatch_types::{ProfileTable, Reading};

use crate::data::{ClassifiedReading, HistoryBuffer};

pub use state::{
    FetchState, Lifecycle, PollSettings, SensorState, DEFAULT_INTERVAL, DEFAULT_RETRIES,
};

/// Errors from controlling a [`Poller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PollerError {
    #[error("poller is already running")]
    AlreadyStarted,

    #[error("poller has been stopped and cannot be restarted")]
    Stopped,

    #[error("poller must be started from within a tokio runtime")]
    NoRuntime,
}

/// Polls a [`TelemetrySource`] and publishes [`SensorState`] updates.
pub struct Poller {
    inner: Arc<Inner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    source: Arc<dyn TelemetrySource>,
    profiles: Arc<ProfileTable>,
    settings: PollSettings,
    shared: Mutex<Shared>,
    state_tx: watch::Sender<SensorState>,
    stop_tx: watch::Sender<bool>,
    refresh: Notify,
}

/// Mutable poller state. Every change is published while the lock is held,
/// so subscribers observe changes in the order they were made.
struct Shared {
    lifecycle: Lifecycle,
    fetch_state: FetchState,
    history: HistoryBuffer<ClassifiedReading>,
    snapshot: Arc<[ClassifiedReading]>,
    current: Option<ClassifiedReading>,
    error: Option<FetchError>,
}

impl Shared {
    fn to_state(&self) -> SensorState {
        SensorState {
            is_loading: self.fetch_state == FetchState::InFlight,
            error: self.error.clone(),
            current: self.current,
            history: self.snapshot.clone(),
        }
    }
}

impl Poller {
    /// Create a poller. Nothing is fetched until [`start`](Self::start).
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        profiles: Arc<ProfileTable>,
        settings: PollSettings,
    ) -> Self {
        let history = HistoryBuffer::new(settings.history_capacity);
        let shared = Shared {
            lifecycle: Lifecycle::Created,
            fetch_state: FetchState::Idle,
            snapshot: history.snapshot(),
            history,
            current: None,
            error: None,
        };
        let (state_tx, _) = watch::channel(shared.to_state());
        let (stop_tx, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                source,
                profiles,
                settings,
                shared: Mutex::new(shared),
                state_tx,
                stop_tx,
                refresh: Notify::new(),
            }),
            task: Mutex::new(None),
        }
    }

    /// Spawn the polling task and run the first cycle immediately.
    pub fn start(&self) -> Result<(), PollerError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| PollerError::NoRuntime)?;

        {
            let mut shared = self.inner.shared.lock();
            match shared.lifecycle {
                Lifecycle::Running => return Err(PollerError::AlreadyStarted),
                Lifecycle::Stopped => return Err(PollerError::Stopped),
                Lifecycle::Created => shared.lifecycle = Lifecycle::Running,
            }
        }

        info!(
            source = self.inner.source.description(),
            interval_ms = self.inner.settings.interval.as_millis() as u64,
            retries = self.inner.settings.retries,
            "starting poller"
        );

        let stop_rx = self.inner.stop_tx.subscribe();
        let handle = runtime.spawn(self.inner.clone().run(stop_rx));
        *self.task.lock() = Some(handle);
        Ok(())
    }

    /// Request a cycle now instead of waiting for the next tick.
    ///
    /// Ignored unless the poller is running.
    pub fn refresh_now(&self) {
        if self.inner.shared.lock().lifecycle != Lifecycle::Running {
            debug!("refresh requested while not running, ignoring");
            return;
        }
        self.inner.refresh.notify_one();
    }

    /// Stop polling. Idempotent.
    ///
    /// After this returns, the published state never changes again.
    pub fn stop(&self) {
        {
            let mut shared = self.inner.shared.lock();
            if shared.lifecycle == Lifecycle::Stopped {
                return;
            }
            shared.lifecycle = Lifecycle::Stopped;
            shared.fetch_state = FetchState::Idle;
            self.inner.publish(&shared);
        }
        self.inner.stop_tx.send_replace(true);
        info!("poller stopped");
    }

    /// Stop polling and wait for the background task to exit.
    ///
    /// If a fetch is in flight this waits for it to complete.
    pub async fn shutdown(&self) {
        self.stop();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "polling task ended abnormally");
            }
        }
    }

    /// Receive every published state, starting with the current one.
    pub fn subscribe(&self) -> watch::Receiver<SensorState> {
        self.inner.state_tx.subscribe()
    }

    /// The current state.
    pub fn state(&self) -> SensorState {
        self.inner.state_tx.borrow().clone()
    }

    /// Recent readings, oldest first.
    pub fn history(&self) -> Arc<[ClassifiedReading]> {
        self.inner.shared.lock().snapshot.clone()
    }

    pub fn fetch_state(&self) -> FetchState {
        self.inner.shared.lock().fetch_state.clone()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.shared.lock().lifecycle
    }

    pub fn settings(&self) -> &PollSettings {
        &self.inner.settings
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.inner.profiles
    }

    /// Description of the polled source.
    pub fn source_description(&self) -> &str {
        self.inner.source.description()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("source", &self.inner.source.description())
            .field("settings", &self.inner.settings)
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}

impl Inner {
    async fn run(self: Arc<Self>, mut stop_rx: watch::Receiver<bool>) {
        let period = self.settings.interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stop_rx.changed() => break,
                _ = ticker.tick() => {}
                _ = self.refresh.notified() => debug!("manual refresh"),
            }

            if !self.poll_cycle().await {
                break;
            }
        }

        debug!("polling task finished");
    }

    /// Run one cycle. Returns false once the poller has stopped.
    async fn poll_cycle(&self) -> bool {
        if !self.begin_cycle() {
            return false;
        }

        let attempts = self.settings.retries.saturating_add(1);
        let mut attempt = 1;
        let result = loop {
            match self.source.fetch().await {
                Ok(reading) => break Ok(reading),
                Err(e) if attempt < attempts && self.is_running() => {
                    debug!(attempt, attempts, error = %e, "fetch failed, retrying");
                    attempt += 1;
                }
                Err(e) => break Err(e),
            }
        };

        self.finish_cycle(result, attempt)
    }

    fn begin_cycle(&self) -> bool {
        let mut shared = self.shared.lock();
        if shared.lifecycle != Lifecycle::Running {
            return false;
        }
        shared.fetch_state = FetchState::InFlight;
        self.publish(&shared);
        true
    }

    fn finish_cycle(&self, result: Result<Reading, FetchError>, attempts: u32) -> bool {
        let mut shared = self.shared.lock();
        if shared.lifecycle != Lifecycle::Running {
            debug!("poller stopped during fetch, discarding result");
            return false;
        }

        match result {
            Ok(reading) => {
                let classified = ClassifiedReading::classify(reading, &self.profiles);
                debug!(
                    timestamp_ms = classified.timestamp_ms(),
                    overall = %classified.overall(),
                    "reading received"
                );
                shared.history.append(classified);
                shared.snapshot = shared.history.snapshot();
                shared.current = Some(classified);
                shared.error = None;
                shared.fetch_state = FetchState::Succeeded(classified);
            }
            Err(e) => {
                warn!(attempts, error = %e, "poll cycle failed");
                shared.error = Some(e.clone());
                shared.fetch_state = FetchState::Failed(e);
            }
        }

        self.publish(&shared);
        true
    }

    fn is_running(&self) -> bool {
        self.shared.lock().lifecycle == Lifecycle::Running
    }

    fn publish(&self, shared: &Shared) {
        self.state_tx.send_replace(shared.to_state());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gaswatch_types::{SensorId, Status};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn reading(ammonia: f64) -> Reading {
        Reading::new([ammonia, 10.0, 5.0], 1_714_564_800_000)
    }

    /// Replays a fixed list of results, then fails.
    #[derive(Debug)]
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Reading, FetchError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Reading, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TelemetrySource for ScriptedSource {
        async fn fetch(&self) -> Result<Reading, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::transport("script exhausted")))
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    /// Returns readings 1, 2, 3... and tracks fetch concurrency.
    #[derive(Debug, Default)]
    struct CountingSource {
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl CountingSource {
        fn with_delay(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl TelemetrySource for CountingSource {
        async fn fetch(&self) -> Result<Reading, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Reading::new([n as f64, 0.0, 0.0], n as u64 * 1000))
        }

        fn description(&self) -> &str {
            "counting"
        }
    }

    /// Blocks every fetch until the test opens the gate.
    #[derive(Debug, Default)]
    struct GatedSource {
        started: Notify,
        gate: Notify,
        completed: AtomicUsize,
    }

    #[async_trait]
    impl TelemetrySource for GatedSource {
        async fn fetch(&self) -> Result<Reading, FetchError> {
            self.started.notify_one();
            self.gate.notified().await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(reading(80.0))
        }

        fn description(&self) -> &str {
            "gated"
        }
    }

    fn slow_settings() -> PollSettings {
        PollSettings::default().interval(Duration::from_secs(3600))
    }

    #[test]
    fn test_start_requires_runtime() {
        let poller = Poller::new(ScriptedSource::new(vec![]), Arc::default(), slow_settings());
        assert_eq!(poller.start(), Err(PollerError::NoRuntime));
        assert_eq!(poller.lifecycle(), Lifecycle::Created);
    }

    #[test]
    fn test_initial_state() {
        let poller = Poller::new(ScriptedSource::new(vec![]), Arc::default(), slow_settings());
        let state = poller.state();
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert!(state.current.is_none());
        assert!(state.history.is_empty());
        assert_eq!(poller.fetch_state(), FetchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_runs_on_start() {
        let source = ScriptedSource::new(vec![Ok(reading(30.0))]);
        let poller = Poller::new(source.clone(), Arc::default(), slow_settings());
        let mut rx = poller.subscribe();

        poller.start().unwrap();
        let state = rx.wait_for(|s| s.current.is_some()).await.unwrap().clone();

        let current = state.current.unwrap();
        assert_eq!(current.value(SensorId::Ammonia), 30.0);
        assert_eq!(current.status(SensorId::Ammonia), Status::Warning);
        assert_eq!(state.history.len(), 1);
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert_eq!(source.calls(), 1);
        assert!(matches!(poller.fetch_state(), FetchState::Succeeded(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_rejected() {
        let poller = Poller::new(ScriptedSource::new(vec![]), Arc::default(), slow_settings());
        poller.start().unwrap();
        assert_eq!(poller.start(), Err(PollerError::AlreadyStarted));
        assert_eq!(poller.lifecycle(), Lifecycle::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_preserves_previous_state() {
        let source = ScriptedSource::new(vec![
            Ok(reading(1.0)),
            Err(FetchError::transport("a")),
            Err(FetchError::status(502, "b")),
            Err(FetchError::transport("c")),
            Err(FetchError::decode("d")),
        ]);
        let poller = Poller::new(source.clone(), Arc::default(), slow_settings());
        let mut rx = poller.subscribe();

        poller.start().unwrap();
        rx.wait_for(|s| s.current.is_some()).await.unwrap();

        poller.refresh_now();
        let state = rx.wait_for(|s| s.error.is_some()).await.unwrap().clone();

        // one attempt plus three retries
        assert_eq!(source.calls(), 5);
        assert_eq!(state.error, Some(FetchError::decode("d")));
        assert_eq!(state.current.map(|c| c.value(SensorId::Ammonia)), Some(1.0));
        assert_eq!(state.history.len(), 1);
        assert!(!state.is_loading);
        assert_eq!(
            poller.fetch_state(),
            FetchState::Failed(FetchError::decode("d"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_clears_error() {
        let source = ScriptedSource::new(vec![
            Err(FetchError::transport("down")),
            Err(FetchError::transport("down")),
            Err(FetchError::transport("down")),
            Err(FetchError::transport("down")),
            Err(FetchError::transport("flaky")),
            Ok(reading(2.0)),
        ]);
        let poller = Poller::new(source.clone(), Arc::default(), slow_settings());
        let mut rx = poller.subscribe();

        poller.start().unwrap();
        let failed = rx.wait_for(|s| s.error.is_some()).await.unwrap().clone();
        assert!(failed.current.is_none());
        assert!(failed.history.is_empty());
        assert_eq!(source.calls(), 4);

        poller.refresh_now();
        let state = rx.wait_for(|s| s.current.is_some()).await.unwrap().clone();
        assert_eq!(source.calls(), 6);
        assert!(state.error.is_none());
        assert_eq!(state.history.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_makes_one_attempt() {
        let source = ScriptedSource::new(vec![Err(FetchError::transport("down"))]);
        let poller = Poller::new(source.clone(), Arc::default(), slow_settings().retries(0));
        let mut rx = poller.subscribe();

        poller.start().unwrap();
        rx.wait_for(|s| s.error.is_some()).await.unwrap();
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_is_bounded_and_ordered() {
        let source = CountingSource::with_delay(Duration::ZERO);
        let settings = PollSettings::default()
            .interval(Duration::from_secs(1))
            .history_capacity(3);
        let poller = Poller::new(source.clone(), Arc::default(), settings);
        let mut rx = poller.subscribe();

        poller.start().unwrap();
        let state = rx
            .wait_for(|s| s.current.is_some_and(|c| c.value(SensorId::Ammonia) >= 6.0))
            .await
            .unwrap()
            .clone();

        let last = state.current.unwrap().value(SensorId::Ammonia);
        let values: Vec<f64> = state
            .history
            .iter()
            .map(|r| r.value(SensorId::Ammonia))
            .collect();
        assert_eq!(values, vec![last - 2.0, last - 1.0, last]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_never_overlap() {
        let source = CountingSource::with_delay(Duration::from_secs(2));
        let settings = PollSettings::default()
            .interval(Duration::from_secs(1))
            .history_capacity(100);
        let poller = Poller::new(source.clone(), Arc::default(), settings);

        poller.start().unwrap();
        for _ in 0..10 {
            poller.refresh_now();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
        poller.shutdown().await;

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);

        // every completed fetch was appended exactly once, in order
        let history = poller.history();
        assert!(history.len() >= 4);
        for (i, r) in history.iter().enumerate() {
            assert_eq!(r.value(SensorId::Ammonia), (i + 1) as f64);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_requests_coalesce() {
        let source = Arc::new(GatedSource::default());
        let poller = Poller::new(source.clone(), Arc::default(), slow_settings());
        let mut rx = poller.subscribe();

        poller.start().unwrap();
        source.started.notified().await;

        for _ in 0..5 {
            poller.refresh_now();
        }
        source.gate.notify_one();

        // the queued requests produce exactly one follow-up cycle
        source.started.notified().await;
        source.gate.notify_one();
        rx.wait_for(|s| s.history.len() == 2 && !s.is_loading)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.completed.load(Ordering::SeqCst), 2);
        assert!(!poller.state().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_flag_tracks_cycle() {
        let source = Arc::new(GatedSource::default());
        let poller = Poller::new(source.clone(), Arc::default(), slow_settings());
        let mut rx = poller.subscribe();

        poller.start().unwrap();
        source.started.notified().await;
        assert!(poller.state().is_loading);
        assert_eq!(poller.fetch_state(), FetchState::InFlight);

        source.gate.notify_one();
        let state = rx.wait_for(|s| s.current.is_some()).await.unwrap().clone();
        assert!(!state.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight_result() {
        let source = Arc::new(GatedSource::default());
        let poller = Poller::new(source.clone(), Arc::default(), slow_settings());

        poller.start().unwrap();
        source.started.notified().await;

        poller.stop();
        let frozen = poller.state();
        assert!(!frozen.is_loading);

        source.gate.notify_one();
        poller.shutdown().await;

        assert_eq!(source.completed.load(Ordering::SeqCst), 1);
        let state = poller.state();
        assert!(state.current.is_none());
        assert!(state.history.is_empty());
        assert!(state.error.is_none());
        assert!(!state.is_loading);
        assert_eq!(poller.fetch_state(), FetchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_terminal_and_idempotent() {
        let source = ScriptedSource::new(vec![Ok(reading(1.0))]);
        let poller = Poller::new(source.clone(), Arc::default(), slow_settings());
        let mut rx = poller.subscribe();

        poller.start().unwrap();
        rx.wait_for(|s| s.current.is_some()).await.unwrap();

        poller.stop();
        poller.stop();
        assert_eq!(poller.lifecycle(), Lifecycle::Stopped);
        assert_eq!(poller.start(), Err(PollerError::Stopped));

        poller.refresh_now();
        tokio::time::sleep(Duration::from_secs(7200)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(poller.history().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_before_start() {
        let poller = Poller::new(ScriptedSource::new(vec![]), Arc::default(), slow_settings());
        poller.stop();
        assert_eq!(poller.start(), Err(PollerError::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let source = CountingSource::with_delay(Duration::ZERO);
        let settings = PollSettings::default().interval(Duration::from_secs(1));
        let poller = Poller::new(source.clone(), Arc::default(), settings);
        let mut rx = poller.subscribe();

        poller.start().unwrap();
        rx.wait_for(|s| s.current.is_some()).await.unwrap();
        let before = source.calls.load(Ordering::SeqCst);

        drop(poller);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), before);
        assert!(!rx.borrow().is_loading);
    }
}
