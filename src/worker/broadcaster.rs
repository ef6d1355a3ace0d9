use crate::utils::clock::Clock;
use crate::worker::messages::{ClientNotifier, WorkerMessage};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

/// Repeating `PERFORM_SYNC` nudge. The worker cannot sync by itself; it only
/// reminds open pages to do it.
pub struct SyncBroadcaster {
    notifier: Arc<dyn ClientNotifier>,
    clock: Arc<dyn Clock>,
    period: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl SyncBroadcaster {
    pub fn new(notifier: Arc<dyn ClientNotifier>, clock: Arc<dyn Clock>, period: Duration) -> Self {
        Self {
            notifier,
            clock,
            period,
            timer: Mutex::new(None),
        }
    }

    fn timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// (Re)start the repeating timer. The first nudge comes one period from
    /// now.
    pub fn schedule(&self) {
        let notifier = Arc::clone(&self.notifier);
        let clock = Arc::clone(&self.clock);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let timestamp = clock.now().timestamp_millis();
                debug!(timestamp, "broadcasting perform-sync");
                notifier.broadcast(&WorkerMessage::PerformSync { timestamp });
            }
        });

        if let Some(old) = self.timer().replace(handle) {
            old.abort();
        }
        info!(period_secs = period.as_secs(), "background sync broadcaster armed");
    }

    pub fn cancel(&self) {
        if let Some(timer) = self.timer().take() {
            timer.abort();
            info!("background sync broadcaster cancelled");
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.timer().is_some()
    }
}

impl Drop for SyncBroadcaster {
    fn drop(&mut self) {
        if let Some(timer) = self.timer().take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::SystemClock;
    use crate::worker::messages::ChannelNotifier;

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<WorkerMessage>) -> usize {
        let mut n = 0;
        while let Ok(m) = rx.try_recv() {
            assert!(matches!(m, WorkerMessage::PerformSync { .. }));
            n += 1;
        }
        n
    }

    #[tokio::test(start_paused = true)]
    async fn nudges_every_period_until_cancelled() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let b = SyncBroadcaster::new(
            Arc::new(notifier),
            Arc::new(SystemClock),
            Duration::from_secs(300),
        );
        b.schedule();
        assert!(b.is_scheduled());

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(drain(&mut rx), 0);

        tokio::time::sleep(Duration::from_secs(302)).await;
        assert_eq!(drain(&mut rx), 2);

        b.cancel();
        assert!(!b.is_scheduled());
        tokio::time::sleep(Duration::from_secs(900)).await;
        assert_eq!(drain(&mut rx), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_keeps_a_single_timer() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let b = SyncBroadcaster::new(
            Arc::new(notifier),
            Arc::new(SystemClock),
            Duration::from_secs(60),
        );
        b.schedule();
        tokio::time::sleep(Duration::from_secs(30)).await;
        b.schedule();

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(drain(&mut rx), 0);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(drain(&mut rx), 1);
    }
}
