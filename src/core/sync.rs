use crate::core::app::App;
use crate::errors::{AppError, AppResult};
use crate::models::{SyncResult, SyncStats, YearMonth};
use crate::ui::messages::{info, success, warning};
use crate::utils::clock::Clock;
use crate::worker::{ChannelNotifier, SyncBroadcaster};
use std::sync::Arc;
use tracing::{debug, info as trace_info};

pub struct SyncLogic;

impl SyncLogic {
    /// One attempt for `ym` through the sync manager, starting from the
    /// persisted cache so only changed dates are touched.
    pub async fn run_once(app: &App, ym: YearMonth) -> AppResult<(SyncResult, SyncStats)> {
        let mut cache = app.entry_cache();
        cache.load_from_storage(ym);

        let manager = app.sync_manager(cache);
        let result = manager.sync_month(ym).await;
        Ok((result, manager.get_sync_stats()))
    }

    pub fn report(ym: YearMonth, result: &SyncResult, stats: &SyncStats) -> AppResult<()> {
        let at = result.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
        if result.success {
            success(format!(
                "Sync of {ym} completed: {} date(s) updated ({at})",
                result.updated_count
            ));
            Ok(())
        } else {
            let err = result.error.clone().unwrap_or_default();
            warning(format!(
                "Sync of {ym} failed ({at}); state={}, retries={}",
                stats.state, stats.retry_count
            ));
            Err(AppError::Sync(err))
        }
    }

    /// Run the periodic manager plus the perform-sync broadcaster until
    /// Ctrl-C. Every nudge from the broadcaster triggers a sync of the
    /// current month.
    pub async fn daemon(app: &App) -> AppResult<()> {
        let ym = YearMonth::of(app.clock.today());
        let mut cache = app.entry_cache();
        cache.load_from_storage(ym);

        let manager = app.sync_manager(cache);
        manager.add_state_listener(|state| trace_info!(state = %state, "sync state"));

        let (notifier, mut nudges) = ChannelNotifier::new();
        let period = app.cfg.worker_settings().background_sync_period;
        let broadcaster = SyncBroadcaster::new(Arc::new(notifier), Arc::clone(&app.clock), period);

        manager.start();
        broadcaster.schedule();
        info(format!(
            "Background sync running (every {}s, nudges every {}s). Press Ctrl-C to stop.",
            app.cfg.sync.interval_secs,
            period.as_secs()
        ));

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    break;
                }
                Some(msg) = nudges.recv() => {
                    if msg.requests_sync() {
                        let ym = YearMonth::of(app.clock.today());
                        let result = manager.sync_month(ym).await;
                        debug!(success = result.success, updated = result.updated_count, "nudged sync finished");
                    }
                }
            }
        }

        broadcaster.cancel();
        manager.stop();
        info("Background sync stopped.");
        Ok(())
    }
}
