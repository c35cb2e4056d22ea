use axum::routing::{get, post};
use axum::Router;

use crate::handlers::managed_playlists;
use crate::state::AppState;

/// Routes mounted at `/managed-playlists`.
///
/// ```text
/// GET  /{id}        -> get_managed_playlist
/// PUT  /{id}        -> update_managed_playlist
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        get(managed_playlists::get_managed_playlist)
            .put(managed_playlists::update_managed_playlist),
    )
}

/// Sync trigger mounted at `/managed-playlists`, outside the request timeout.
///
/// ```text
/// POST /{id}/sync   -> sync_managed_playlist
/// ```
pub fn sync_router() -> Router<AppState> {
    Router::new().route("/{id}/sync", post(managed_playlists::sync_managed_playlist))
}
