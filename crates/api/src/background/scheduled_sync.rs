//! In-process sync scheduler.
//!
//! Enabled by `SYNC_SCHEDULER_INTERVAL_SECS`. Each tick runs the sync job
//! for every due destination. A tick that finds a run already in progress
//! (a cron or manual trigger) is skipped rather than queued.

use std::sync::Arc;
use std::time::Duration;

use playlistfox_sync::{AccessTokenSource, SyncDriver, SyncRequest, SyncStore, TrackCatalog};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the scheduler loop until `cancel` is triggered.
///
/// The first tick fires immediately.
pub async fn run<C, S, T>(driver: Arc<SyncDriver<C, S, T>>, period: Duration, cancel: CancellationToken)
where
    C: TrackCatalog,
    S: SyncStore,
    T: AccessTokenSource,
{
    tracing::info!(interval_secs = period.as_secs(), "Sync scheduler started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let request = SyncRequest::default();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Sync scheduler stopping");
                break;
            }
            _ = interval.tick() => {
                match driver.try_run(&request).await {
                    Some(Ok(summary)) => {
                        if summary.total > 0 {
                            tracing::info!(
                                run_id = %summary.run_id,
                                total = summary.total,
                                failed = summary.failed,
                                tracks_added = summary.tracks_added,
                                "Scheduled sync finished"
                            );
                        } else {
                            tracing::debug!("Scheduled sync: nothing due");
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Scheduled sync failed");
                    }
                    None => {
                        tracing::debug!("Scheduled sync skipped, a run is in progress");
                    }
                }
            }
        }
    }
}
