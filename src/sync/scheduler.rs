//! Debounced fetch scheduler
//!
//! Coalesces bursts of range/identity changes into one fetch per quiet
//! period, skips fetches whose key matches the last completed one, and
//! publishes the outcome as a [`FetchState`].
//!
//! The timer task is aborted whenever a newer `schedule` arrives. Fetches
//! themselves are never cancelled: a result is applied only if the scheduler
//! is still alive and the result's key is still the expected one.

use crate::sources::{ReportFilters, ReportSource};
use crate::types::{DateRange, FetchKey, FetchState, Identity};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Text shown to the user for any failed fetch
pub const FETCH_ERROR_MESSAGE: &str = "Unable to load report data. Please try again.";

pub type KeyFn = Arc<dyn Fn(&Identity, &DateRange) -> FetchKey + Send + Sync>;

#[derive(Default)]
struct SchedulerState {
    pending: Option<JoinHandle<()>>,
    /// Bumped by every `schedule`; a timer only fires if it is still current
    timer_seq: u64,
    last_key: Option<FetchKey>,
    expected_key: Option<FetchKey>,
    completed: u64,
    issued: u64,
    alive: bool,
}

/// Shared between the scheduler handle and its timer/fetch tasks
struct Shared {
    source: Arc<dyn ReportSource>,
    key_fn: KeyFn,
    state: Mutex<SchedulerState>,
    outcome: watch::Sender<FetchState>,
    extra: serde_json::Map<String, serde_json::Value>,
}

pub struct FetchScheduler {
    shared: Arc<Shared>,
    quiet_period: Duration,
}

impl FetchScheduler {
    pub fn new(source: Arc<dyn ReportSource>, quiet_period: Duration) -> Self {
        Self::build(source, quiet_period, Arc::new(FetchKey::new), serde_json::Map::new())
    }

    pub fn with_key_fn(source: Arc<dyn ReportSource>, quiet_period: Duration, key_fn: KeyFn) -> Self {
        Self::build(source, quiet_period, key_fn, serde_json::Map::new())
    }

    /// Report-specific filters sent with every fetch
    pub fn with_extra_filters(
        source: Arc<dyn ReportSource>,
        quiet_period: Duration,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self::build(source, quiet_period, Arc::new(FetchKey::new), extra)
    }

    fn build(
        source: Arc<dyn ReportSource>,
        quiet_period: Duration,
        key_fn: KeyFn,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let (outcome, _rx) = watch::channel(FetchState::Idle);
        Self {
            shared: Arc::new(Shared {
                source,
                key_fn,
                state: Mutex::new(SchedulerState {
                    alive: true,
                    ..SchedulerState::default()
                }),
                outcome,
                extra,
            }),
            quiet_period,
        }
    }

    pub fn state(&self) -> FetchState {
        self.shared.outcome.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.shared.outcome.subscribe()
    }

    /// Number of fetches actually handed to the source
    pub fn issued(&self) -> u64 {
        self.shared.state.lock().issued
    }

    /// Restarts the quiet-period timer with these parameters. `identity ==
    /// None` (no project selected) only cancels the pending timer. Must be
    /// called from within a tokio runtime.
    pub fn schedule(&self, range: DateRange, identity: Option<Identity>, force: bool) {
        let mut state = self.shared.state.lock();
        if !state.alive {
            return;
        }
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        // a timer already past its sleep cannot be aborted; retire its seq
        state.timer_seq += 1;

        let Some(identity) = identity else {
            debug!(report = self.shared.source.name(), "no project selected, fetch suppressed");
            return;
        };

        let seq = state.timer_seq;
        let shared = Arc::clone(&self.shared);
        let quiet_period = self.quiet_period;
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            Shared::fire(shared, seq, range, identity, force);
        }));
    }

    /// Cancels the pending timer and ignores any fetch still in flight
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        state.alive = false;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
    }

    pub fn is_alive(&self) -> bool {
        self.shared.state.lock().alive
    }
}

impl Drop for FetchScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Shared {
    /// Timer expired: dedup, then hand the fetch to its own task so a later
    /// `schedule` cannot cancel it.
    fn fire(shared: Arc<Shared>, seq: u64, range: DateRange, identity: Identity, force: bool) {
        let key = (shared.key_fn)(&identity, &range);
        {
            let mut state = shared.state.lock();
            // superseded between timer expiry and here
            if !state.alive || state.timer_seq != seq {
                return;
            }
            state.pending = None;

            if !force && state.completed > 0 && state.last_key.as_ref() == Some(&key) {
                debug!(report = shared.source.name(), key = %key, "skipping duplicate fetch");
                return;
            }

            state.last_key = Some(key.clone());
            state.expected_key = Some(key.clone());
            state.issued += 1;
            shared.outcome.send_replace(FetchState::Loading { key: key.clone() });
        }

        info!(report = shared.source.name(), key = %key, force, "fetching report");

        let filters = ReportFilters::new(&identity, &range).with_extra(shared.extra.clone());
        tokio::spawn(async move {
            let result = shared.source.fetch(&filters).await;

            let mut state = shared.state.lock();
            if !state.alive {
                debug!(report = shared.source.name(), key = %key, "screen torn down, dropping result");
                return;
            }
            if state.expected_key.as_ref() != Some(&key) {
                debug!(report = shared.source.name(), key = %key, "stale result dropped");
                return;
            }
            state.completed += 1;

            let outcome = match result {
                Ok(response) if response.is_failure() => {
                    warn!(
                        report = shared.source.name(),
                        key = %key,
                        status = response.status,
                        message = response.message.as_deref().unwrap_or(""),
                        "report API signalled failure"
                    );
                    FetchState::Error { key, message: FETCH_ERROR_MESSAGE.to_string() }
                }
                Ok(response) if response.is_empty() => FetchState::Empty { key },
                Ok(response) => FetchState::Success { key, data: response.data },
                Err(e) => {
                    warn!(report = shared.source.name(), key = %key, error = %e, "report fetch failed");
                    FetchState::Error { key, message: FETCH_ERROR_MESSAGE.to_string() }
                }
            };
            // published under the lock so a newer Loading cannot be overwritten
            shared.outcome.send_replace(outcome);
        });
    }
}
