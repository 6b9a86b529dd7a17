//! Time-bounded roster cache with single-flight reloads
//!
//! The cache holds at most one [`RosterSnapshot`]. A snapshot younger than
//! the TTL is served as-is. Otherwise the caller reloads from the
//! [`RosterSource`]. Concurrent callers that find the snapshot stale all
//! await the same in-flight reload instead of each hitting the source.

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::errors::{RosterError, RosterResult};
use crate::models::RosterSnapshot;
use crate::sources::RosterSource;
use crate::utils::Clock;

type ReloadFuture = Shared<BoxFuture<'static, RosterResult<Arc<RosterSnapshot>>>>;

/// What to do when a reload fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleRosterPolicy {
    /// Fail the request that triggered the reload
    #[default]
    FailFast,
    /// Serve the last good snapshot; fail only if none was ever loaded
    ServeStale,
}

#[derive(Default)]
struct CacheState {
    snapshot: Option<Arc<RosterSnapshot>>,
    invalidated: bool,
    /// In-flight reload tagged with its generation
    pending: Option<(u64, ReloadFuture)>,
    next_generation: u64,
}

/// Roster cache shared by every verification request
pub struct RosterCache {
    source: Arc<dyn RosterSource>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    policy: StaleRosterPolicy,
    state: Mutex<CacheState>,
}

impl RosterCache {
    pub fn new(source: Arc<dyn RosterSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            policy: StaleRosterPolicy::default(),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn with_policy(mut self, policy: StaleRosterPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> StaleRosterPolicy {
        self.policy
    }

    /// Current snapshot, reloading first if it is missing or stale
    pub async fn get(&self) -> RosterResult<Arc<RosterSnapshot>> {
        let (generation, reload) = {
            let mut state = self.lock_state();

            if let Some(snapshot) = self.fresh_snapshot(&state) {
                return Ok(snapshot);
            }

            let in_flight = state
                .pending
                .as_ref()
                .map(|(generation, reload)| (*generation, reload.clone()));

            match in_flight {
                Some((generation, reload)) => {
                    debug!(generation, "Joining in-flight roster reload");
                    (generation, reload)
                }
                None => {
                    let generation = state.next_generation;
                    state.next_generation += 1;
                    let reload = self.start_reload();
                    state.pending = Some((generation, reload.clone()));
                    debug!(generation, source = %self.source.describe(), "Starting roster reload");
                    (generation, reload)
                }
            }
        };

        let result = reload.await;

        let mut state = self.lock_state();
        let is_current = matches!(&state.pending, Some((pending, _)) if *pending == generation);
        if is_current {
            state.pending = None;
            if let Ok(snapshot) = &result {
                state.snapshot = Some(Arc::clone(snapshot));
                state.invalidated = false;
            }
        }

        match result {
            Ok(snapshot) => Ok(snapshot),
            Err(error) => match (self.policy, &state.snapshot) {
                (StaleRosterPolicy::ServeStale, Some(previous)) => {
                    warn!(
                        error = %error,
                        loaded_at = %previous.loaded_at(),
                        "Roster reload failed, serving stale snapshot"
                    );
                    Ok(Arc::clone(previous))
                }
                _ => {
                    warn!(error = %error, "Roster reload failed");
                    Err(error)
                }
            },
        }
    }

    /// Force the next [`get`](Self::get) to reload
    ///
    /// A reload already in flight still completes for its waiters but its
    /// result is not installed.
    pub fn invalidate(&self) {
        let mut state = self.lock_state();
        state.invalidated = true;
        state.pending = None;
        debug!("Roster cache invalidated");
    }

    /// Current snapshot without triggering a reload
    pub fn peek(&self) -> Option<Arc<RosterSnapshot>> {
        self.lock_state().snapshot.clone()
    }

    fn fresh_snapshot(&self, state: &CacheState) -> Option<Arc<RosterSnapshot>> {
        if state.invalidated {
            return None;
        }
        let snapshot = state.snapshot.as_ref()?;
        let age = self.clock.now() - snapshot.loaded_at();
        (age < self.ttl).then(|| Arc::clone(snapshot))
    }

    fn start_reload(&self) -> ReloadFuture {
        let source = Arc::clone(&self.source);
        let clock = Arc::clone(&self.clock);

        // A panic inside a `Shared` future would resurface in every later
        // poll of the same future; it is turned into an error instead.
        AssertUnwindSafe(async move {
            let started = Instant::now();
            let records = source.load().await?;
            let snapshot = Arc::new(RosterSnapshot::new(records, clock.now()));
            info!(
                source = %source.describe(),
                records = snapshot.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Roster reloaded"
            );
            Ok::<_, RosterError>(snapshot)
        })
        .catch_unwind()
        .map(|outcome| {
            outcome.unwrap_or_else(|payload| {
                Err(RosterError::ReloadAborted {
                    message: panic_message(payload.as_ref()),
                })
            })
        })
        .boxed()
        .shared()
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "roster source panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RosterRecord;
    use crate::utils::ManualClock;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(300);

    struct FakeSource {
        loads: AtomicUsize,
        failing: AtomicBool,
    }

    impl FakeSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                loads: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
            })
        }

        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl RosterSource for FakeSource {
        async fn load(&self) -> RosterResult<Vec<RosterRecord>> {
            let load = self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.failing.load(Ordering::SeqCst) {
                return Err(RosterError::io("roster.xlsx", "unavailable"));
            }
            Ok(vec![RosterRecord::new(format!("Participant {load}"), "Team Alpha")])
        }

        fn describe(&self) -> String {
            "fake roster".to_string()
        }
    }

    fn cache(source: &Arc<FakeSource>, clock: &Arc<ManualClock>) -> RosterCache {
        RosterCache::new(source.clone(), clock.clone(), TTL)
    }

    #[tokio::test]
    async fn test_fresh_snapshot_is_served_without_reload() {
        let source = FakeSource::new();
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&source, &clock);

        let first = cache.get().await.unwrap();
        clock.advance(chrono::Duration::seconds(299));
        let second = cache.get().await.unwrap();

        assert_eq!(source.loads(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_snapshot_at_ttl_is_stale() {
        let source = FakeSource::new();
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&source, &clock);

        let first = cache.get().await.unwrap();
        clock.advance(chrono::Duration::seconds(300));
        let second = cache.get().await.unwrap();

        assert_eq!(source.loads(), 2);
        assert!(second.loaded_at() > first.loaded_at());
        assert_eq!(second.records()[0].participant_name, "Participant 1");
    }

    #[tokio::test]
    async fn test_concurrent_stale_gets_share_one_reload() {
        let source = FakeSource::new();
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&source, &clock);

        let results = futures::future::join_all((0..16).map(|_| cache.get())).await;

        assert_eq!(source.loads(), 1);
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
        }
    }

    #[tokio::test]
    async fn test_fail_fast_propagates_and_keeps_previous_snapshot() {
        let source = FakeSource::new();
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&source, &clock);

        let good = cache.get().await.unwrap();
        clock.advance(chrono::Duration::minutes(10));
        source.set_failing(true);

        let err = cache.get().await.unwrap_err();
        assert!(matches!(err, RosterError::Io { .. }));
        assert!(Arc::ptr_eq(&cache.peek().unwrap(), &good));
    }

    #[tokio::test]
    async fn test_serve_stale_falls_back_to_previous_snapshot() {
        let source = FakeSource::new();
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&source, &clock).with_policy(StaleRosterPolicy::ServeStale);

        let good = cache.get().await.unwrap();
        clock.advance(chrono::Duration::minutes(10));
        source.set_failing(true);

        let served = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&served, &good));
        assert_eq!(source.loads(), 2);
    }

    #[tokio::test]
    async fn test_serve_stale_without_any_snapshot_fails() {
        let source = FakeSource::new();
        source.set_failing(true);
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&source, &clock).with_policy(StaleRosterPolicy::ServeStale);

        assert!(cache.get().await.is_err());
        assert!(cache.peek().is_none());
    }

    #[tokio::test]
    async fn test_failed_reload_is_retried_by_next_get() {
        let source = FakeSource::new();
        source.set_failing(true);
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&source, &clock);

        assert!(cache.get().await.is_err());
        source.set_failing(false);
        assert!(cache.get().await.is_ok());
        assert_eq!(source.loads(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let source = FakeSource::new();
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&source, &clock);

        cache.get().await.unwrap();
        cache.invalidate();
        let reloaded = cache.get().await.unwrap();

        assert_eq!(source.loads(), 2);
        assert_eq!(reloaded.records()[0].participant_name, "Participant 1");
        cache.get().await.unwrap();
        assert_eq!(source.loads(), 2);
    }

    /// Panics on its first load, succeeds afterwards
    struct PanicOnceSource {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl RosterSource for PanicOnceSource {
        async fn load(&self) -> RosterResult<Vec<RosterRecord>> {
            if self.loads.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("worksheet vanished");
            }
            Ok(vec![RosterRecord::new("Jane Doe", "Team Alpha")])
        }

        fn describe(&self) -> String {
            "panicking roster".to_string()
        }
    }

    #[tokio::test]
    async fn test_panicking_reload_fails_and_is_retried() {
        let source = Arc::new(PanicOnceSource {
            loads: AtomicUsize::new(0),
        });
        let cache = RosterCache::new(source.clone(), Arc::new(ManualClock::default()), TTL);

        let err = cache.get().await.unwrap_err();
        assert_eq!(
            err,
            RosterError::ReloadAborted {
                message: "worksheet vanished".to_string()
            }
        );
        assert!(cache.peek().is_none());

        let snapshot = cache.get().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panic_message_reads_both_payload_kinds() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&"owned".to_string()), "owned");
        assert_eq!(panic_message(&42u8), "roster source panicked");
    }

    #[tokio::test]
    async fn test_peek_never_loads() {
        let source = FakeSource::new();
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&source, &clock);

        assert!(cache.peek().is_none());
        assert_eq!(source.loads(), 0);
    }
}
