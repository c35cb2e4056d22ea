pub mod account;
pub mod audit;
pub mod cron;
pub mod health;
pub mod managed_playlists;
pub mod player;
pub mod playlists;
pub mod subscriptions;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree, except the sync triggers (see
/// [`sync_routes`]).
///
/// Route hierarchy:
///
/// ```text
/// /webhooks/identity                    identity provider webhooks (signed)
///
/// /me                                   current user
/// /me/top-artists                       top artists
/// /token                                Spotify access token
/// /search                               search
///
/// /playlists/mine                       caller's Spotify playlists
/// /playlists/featured                   curated playlists
/// /playlists/categories/{category_id}   category playlists
/// /playlists/{spotify_id}               playlist detail
/// /playlists/{spotify_id}/tracks        playlist tracks page
///
/// /player                               playback state
/// /player/devices                       devices
/// /player/play|pause|next|previous      playback control
/// /player/transfer                      transfer playback
///
/// /subscriptions                        list, subscribe
/// /subscriptions/{id}                   get, unsubscribe
///
/// /managed-playlists/{id}               get, update settings
///
/// /audit                                caller's audit trail
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Unauthenticated routes guarded by their own secrets.
        .nest("/webhooks", webhooks::router())
        // Session-authenticated routes.
        .merge(account::router())
        .nest("/playlists", playlists::router())
        .nest("/player", player::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/managed-playlists", managed_playlists::router())
        .nest("/audit", audit::router())
}

/// Sync triggers, with full `/api/v1` paths.
///
/// A run can take longer than the request timeout, so these are mounted
/// outside it.
///
/// ```text
/// /api/v1/cron/sync                         scheduler trigger (cron secret)
/// /api/v1/managed-playlists/{id}/sync       sync now (session)
/// ```
pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .nest("/api/v1/cron", cron::router())
        .nest("/api/v1/managed-playlists", managed_playlists::sync_router())
}
