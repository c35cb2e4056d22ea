//! Scheduler trigger for the sync job.

use axum::extract::{Query, State};
use axum::Json;
use playlistfox_sync::{SyncRequest, SyncSummary};

use crate::error::AppResult;
use crate::handlers::run_sync_detached;
use crate::middleware::cron::CronAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET|POST /api/v1/cron/sync
///
/// Sync every due destination, or the subset selected by `force`,
/// `user_id`, `playlist_id`, and `source_id`. Waits for a run already in
/// progress rather than overlapping it. Mounted outside the request timeout.
pub async fn run_sync(
    _auth: CronAuth,
    State(state): State<AppState>,
    Query(request): Query<SyncRequest>,
) -> AppResult<Json<DataResponse<SyncSummary>>> {
    let summary = run_sync_detached(&state, request).await?;

    tracing::info!(
        run_id = %summary.run_id,
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        tracks_added = summary.tracks_added,
        duration_ms = summary.duration_ms,
        "Cron sync finished",
    );
    Ok(Json(DataResponse { data: summary }))
}
