pub mod audit;
pub mod cron;
pub mod managed_playlists;
pub mod me;
pub mod player;
pub mod playlists;
pub mod search;
pub mod subscriptions;
pub mod webhooks;

use std::sync::Arc;

use playlistfox_sync::{AccessTokenSource, SyncRequest, SyncSummary};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// The caller's Spotify access token, fetched from the identity provider.
pub(crate) async fn spotify_token(state: &AppState, auth: &AuthUser) -> AppResult<String> {
    Ok(state.identity.access_token(&auth.external_id).await?)
}

/// Run a sync on its own task and wait for the summary.
///
/// The run outlives the request: a client that disconnects does not cancel
/// it halfway through a destination.
pub(crate) async fn run_sync_detached(
    state: &AppState,
    request: SyncRequest,
) -> AppResult<SyncSummary> {
    let driver = Arc::clone(&state.sync);
    let summary = tokio::spawn(async move { driver.run(&request).await })
        .await
        .map_err(|e| AppError::InternalError(format!("Sync task failed: {e}")))??;
    Ok(summary)
}
