//! Background sync manager: a small state machine (idle / syncing / error /
//! offline) driving periodic synchronization of the entry status cache
//! against a [`RecordSource`].
//!
//! A single tokio task owns the pending timer. It sleeps, runs one attempt
//! to completion and loops, so at most one scheduled attempt is in flight.
//! Manual attempts may overlap a scheduled one; the cache's per-date
//! idempotence keeps that safe.

use crate::cache::EntryStatusCache;
use crate::errors::{AppError, AppResult};
use crate::models::{DailyEntry, SyncResult, SyncState, SyncStats, YearMonth};
use crate::sync::source::RecordSource;
use crate::utils::clock::Clock;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub type SharedCache = Arc<Mutex<EntryStatusCache>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Steady-state delay between attempts.
    pub sync_interval: Duration,
    /// Delay after a failed attempt.
    pub retry_delay: Duration,
    pub max_retries: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(5 * 60),
            retry_delay: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(SyncState) + Send + Sync>;

struct Inner {
    state: SyncState,
    retry_count: u32,
    running: bool,
    last_result: Option<SyncResult>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    timer: Option<JoinHandle<()>>,
}

struct Shared {
    cache: SharedCache,
    source: Arc<dyn RecordSource>,
    clock: Arc<dyn Clock>,
    settings: SyncSettings,
    inner: Mutex<Inner>,
}

/// Cheap to clone; all clones drive the same manager.
#[derive(Clone)]
pub struct BackgroundSyncManager {
    shared: Arc<Shared>,
}

impl BackgroundSyncManager {
    pub fn new(
        cache: SharedCache,
        source: Arc<dyn RecordSource>,
        clock: Arc<dyn Clock>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                cache,
                source,
                clock,
                settings,
                inner: Mutex::new(Inner {
                    state: SyncState::Idle,
                    retry_count: 0,
                    running: false,
                    last_result: None,
                    listeners: Vec::new(),
                    next_listener: 0,
                    timer: None,
                }),
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        // Listener panics are caught outside the lock, so poisoning only
        // follows a bug in this module; keep going with the data as-is.
        self.shared
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> SyncState {
        self.inner().state
    }

    pub fn cache(&self) -> &SharedCache {
        &self.shared.cache
    }

    // ---------------------------------------------------------------
    // Listeners
    // ---------------------------------------------------------------

    pub fn add_state_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(SyncState) + Send + Sync + 'static,
    {
        let mut inner = self.inner();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn remove_state_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    fn notify(&self, state: SyncState) {
        let listeners: Vec<Listener> = self
            .inner()
            .listeners
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(state))).is_err() {
                error!(state = %state, "sync state listener panicked");
            }
        }
    }

    fn set_state(&self, state: SyncState) {
        let changed = {
            let mut inner = self.inner();
            let changed = inner.state != state;
            inner.state = state;
            changed
        };
        if changed {
            debug!(state = %state, "sync state changed");
            self.notify(state);
        }
    }

    // ---------------------------------------------------------------
    // Scheduling
    // ---------------------------------------------------------------

    /// Arm the periodic schedule. Calling it again while running is a no-op.
    pub fn start(&self) {
        {
            let mut inner = self.inner();
            if inner.running && inner.timer.is_some() {
                return;
            }
            inner.running = true;
        }
        info!(
            interval_secs = self.shared.settings.sync_interval.as_secs(),
            "background sync started"
        );
        self.arm_timer();
    }

    /// Cancel the pending timer and force `Idle` without notifying listeners.
    pub fn stop(&self) {
        let mut inner = self.inner();
        inner.running = false;
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.state = SyncState::Idle;
        info!("background sync stopped");
    }

    fn next_delay(&self) -> Duration {
        let s = &self.shared.settings;
        if self.inner().retry_count > 0 {
            s.retry_delay
        } else {
            s.sync_interval
        }
    }

    fn arm_timer(&self) {
        let me = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                let delay = me.next_delay();
                tokio::time::sleep(delay).await;

                if !me.inner().running {
                    break;
                }
                let ym = YearMonth::of(me.shared.clock.today());
                let result = me.sync_month(ym).await;
                debug!(success = result.success, updated = result.updated_count, "scheduled sync finished");
            }
        });

        let mut inner = self.inner();
        if let Some(old) = inner.timer.replace(handle) {
            old.abort();
        }
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self.inner().timer.take() {
            timer.abort();
        }
    }

    /// Network went away: cancel the timer and report `Offline`.
    pub fn go_offline(&self) {
        self.cancel_timer();
        self.set_state(SyncState::Offline);
        info!("sync paused: offline");
    }

    /// Network is back: report `Idle` and re-arm the schedule if running.
    /// A timer that is still pending (or mid-attempt) is left alone.
    pub fn go_online(&self) {
        if self.state() == SyncState::Offline {
            self.set_state(SyncState::Idle);
        }
        let rearm = {
            let inner = self.inner();
            inner.running && inner.timer.as_ref().is_none_or(|t| t.is_finished())
        };
        if rearm {
            self.arm_timer();
        }
        info!("sync resumed: online");
    }

    // ---------------------------------------------------------------
    // Attempts
    // ---------------------------------------------------------------

    /// Sync `ym` with records the caller already has.
    pub async fn manual_sync(&self, ym: YearMonth, records: Vec<DailyEntry>) -> SyncResult {
        self.set_state(SyncState::Syncing);
        let outcome = self.apply(ym, &records);
        self.finish_attempt(outcome)
    }

    /// Fetch `ym` from the record source and sync it.
    pub async fn sync_month(&self, ym: YearMonth) -> SyncResult {
        self.set_state(SyncState::Syncing);
        let outcome = match self
            .shared
            .source
            .fetch_monthly_records(ym.year(), ym.month(), false)
            .await
        {
            Ok(records) => self.apply(ym, &records),
            Err(e) => Err(e),
        };
        self.finish_attempt(outcome)
    }

    fn apply(&self, ym: YearMonth, records: &[DailyEntry]) -> AppResult<usize> {
        let mut cache = self
            .shared
            .cache
            .lock()
            .map_err(|_| AppError::Sync("entry cache lock poisoned".into()))?;
        cache.sync_incremental_changes(ym, records, None)
    }

    fn finish_attempt(&self, outcome: AppResult<usize>) -> SyncResult {
        let now = self.shared.clock.now();
        let result = match outcome {
            Ok(n) => SyncResult::ok(n, now),
            Err(e) => SyncResult::failed(e.to_string(), now),
        };

        let next_state = {
            let mut inner = self.inner();
            inner.last_result = Some(result.clone());

            if inner.state == SyncState::Offline {
                None
            } else if result.success {
                inner.retry_count = 0;
                Some(SyncState::Idle)
            } else {
                inner.retry_count += 1;
                if inner.retry_count >= self.shared.settings.max_retries {
                    inner.retry_count = 0;
                    Some(SyncState::Error)
                } else {
                    Some(SyncState::Idle)
                }
            }
        };

        match &result.error {
            None => info!(updated = result.updated_count, "sync succeeded"),
            Some(err) => warn!(error = %err, "sync failed"),
        }

        if let Some(state) = next_state {
            self.set_state(state);
        }
        result
    }

    pub fn get_sync_stats(&self) -> SyncStats {
        let inner = self.inner();
        SyncStats {
            state: inner.state,
            retry_count: inner.retry_count,
            is_running: inner.running,
            last_result: inner.last_result.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::utils::clock::SystemClock;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct FakeSource {
        records: Mutex<Vec<DailyEntry>>,
        fail: std::sync::atomic::AtomicBool,
        calls: AtomicU32,
        latency: Duration,
    }

    fn slow_source(latency: Duration) -> Arc<FakeSource> {
        Arc::new(FakeSource {
            latency,
            ..Default::default()
        })
    }

    #[async_trait]
    impl RecordSource for FakeSource {
        async fn fetch_monthly_records(
            &self,
            _year: i32,
            _month: u32,
            _force_refresh: bool,
        ) -> AppResult<Vec<DailyEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::Network("backend unreachable".into()));
            }
            Ok(self.records.lock().unwrap().clone())
        }
    }

    fn settings() -> SyncSettings {
        SyncSettings {
            sync_interval: Duration::from_secs(60),
            retry_delay: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    fn manager(source: Arc<FakeSource>) -> BackgroundSyncManager {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = EntryStatusCache::new(
            Arc::new(MemoryStore::new()),
            clock.clone(),
            chrono::Duration::minutes(30),
        );
        BackgroundSyncManager::new(Arc::new(Mutex::new(cache)), source, clock, settings())
    }

    fn record_states(m: &BackgroundSyncManager) -> Arc<Mutex<Vec<SyncState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        m.add_state_listener(move |s| sink.lock().unwrap().push(s));
        seen
    }

    fn jan() -> YearMonth {
        "2025-01".parse().unwrap()
    }

    #[tokio::test]
    async fn three_failures_exhaust_the_retry_budget() {
        let source = Arc::new(FakeSource::default());
        source.fail.store(true, Ordering::SeqCst);
        let m = manager(source);
        let seen = record_states(&m);

        let first = m.sync_month(jan()).await;
        assert!(!first.success);
        assert_eq!(m.get_sync_stats().retry_count, 1);
        m.sync_month(jan()).await;
        assert_eq!(m.get_sync_stats().retry_count, 2);
        m.sync_month(jan()).await;

        use SyncState::*;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Syncing, Idle, Syncing, Idle, Syncing, Error]
        );
        let stats = m.get_sync_stats();
        assert_eq!(stats.state, Error);
        assert_eq!(stats.retry_count, 0);
        assert!(stats.last_result.unwrap().error.unwrap().contains("unreachable"));
    }

    #[tokio::test]
    async fn success_resets_the_retry_counter() {
        let source = Arc::new(FakeSource::default());
        source.fail.store(true, Ordering::SeqCst);
        let m = manager(source.clone());

        m.sync_month(jan()).await;
        assert_eq!(m.get_sync_stats().retry_count, 1);

        source.fail.store(false, Ordering::SeqCst);
        let ok = m.sync_month(jan()).await;
        assert!(ok.success);
        assert_eq!(m.get_sync_stats().retry_count, 0);
        assert_eq!(m.state(), SyncState::Idle);
    }

    #[tokio::test]
    async fn manual_sync_feeds_the_cache() {
        let m = manager(Arc::new(FakeSource::default()));
        let records = vec![
            DailyEntry::new("2025-01-02", "09:00", None, "17:00"),
            DailyEntry::new("2025-01-03", "", None, ""),
        ];

        let first = m.manual_sync(jan(), records.clone()).await;
        assert!(first.success);
        assert_eq!(first.updated_count, 2);
        assert!(m.cache().lock().unwrap().is_date_entered("2025-01-02").has_entry);

        let again = m.manual_sync(jan(), records).await;
        assert_eq!(again.updated_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_sync_fires_on_the_interval() {
        let source = Arc::new(FakeSource::default());
        let m = manager(source.clone());
        m.start();

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        m.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycle_retries_sooner() {
        let source = Arc::new(FakeSource::default());
        source.fail.store(true, Ordering::SeqCst);
        let m = manager(source.clone());
        m.start();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        m.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn offline_cancels_and_online_reschedules() {
        let source = Arc::new(FakeSource::default());
        let m = manager(source.clone());
        let seen = record_states(&m);
        m.start();

        m.go_offline();
        assert_eq!(m.state(), SyncState::Offline);
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        m.go_online();
        assert_eq!(m.state(), SyncState::Idle);
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        use SyncState::*;
        assert_eq!(*seen.lock().unwrap(), vec![Offline, Idle, Syncing, Idle]);
        m.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_online_signal_keeps_the_attempt_in_flight() {
        let source = slow_source(Duration::from_secs(10));
        let m = manager(source.clone());
        let seen = record_states(&m);
        m.start();

        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(m.state(), SyncState::Syncing);

        m.go_online();
        assert_eq!(m.state(), SyncState::Syncing);

        tokio::time::sleep(Duration::from_secs(30)).await;
        let stats = m.get_sync_stats();
        assert_eq!(stats.state, SyncState::Idle);
        assert!(stats.last_result.unwrap().success);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        use SyncState::*;
        assert_eq!(*seen.lock().unwrap(), vec![Syncing, Idle]);

        tokio::time::sleep(Duration::from_secs(40)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        m.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn offline_during_scheduled_attempt_stays_offline() {
        let source = slow_source(Duration::from_secs(10));
        let m = manager(source.clone());
        let seen = record_states(&m);
        m.start();

        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(m.state(), SyncState::Syncing);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        m.go_offline();
        assert_eq!(m.state(), SyncState::Offline);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(m.state(), SyncState::Offline);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        use SyncState::*;
        assert_eq!(*seen.lock().unwrap(), vec![Syncing, Offline]);

        m.go_online();
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        m.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn offline_manual_attempt_does_not_leave_offline() {
        let source = slow_source(Duration::from_secs(10));
        let m = manager(source.clone());

        let worker = m.clone();
        let attempt = tokio::spawn(async move { worker.sync_month(jan()).await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(m.state(), SyncState::Syncing);

        m.go_offline();
        let result = attempt.await.unwrap();

        assert!(result.success);
        assert_eq!(m.state(), SyncState::Offline);
        assert_eq!(m.get_sync_stats().retry_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_silently() {
        let source = Arc::new(FakeSource::default());
        let m = manager(source.clone());
        m.start();
        m.go_offline();
        let seen = record_states(&m);

        m.stop();
        assert_eq!(m.state(), SyncState::Idle);
        assert!(!m.get_sync_stats().is_running);
        assert!(seen.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn panicking_listener_does_not_block_others() {
        let m = manager(Arc::new(FakeSource::default()));
        m.add_state_listener(|_| panic!("listener bug"));
        let seen = record_states(&m);

        let result = m.manual_sync(jan(), Vec::new()).await;
        assert!(result.success);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![SyncState::Syncing, SyncState::Idle]
        );
    }

    #[tokio::test]
    async fn removed_listener_is_not_called() {
        let m = manager(Arc::new(FakeSource::default()));
        let seen = Arc::new(Mutex::new(0));
        let sink = seen.clone();
        let id = m.add_state_listener(move |_| *sink.lock().unwrap() += 1);
        assert!(m.remove_state_listener(id));
        assert!(!m.remove_state_listener(id));

        m.manual_sync(jan(), Vec::new()).await;
        assert_eq!(*seen.lock().unwrap(), 0);
    }
}
