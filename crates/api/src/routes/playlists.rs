use axum::routing::get;
use axum::Router;

use crate::handlers::playlists;
use crate::state::AppState;

/// Routes mounted at `/playlists`.
///
/// ```text
/// GET /mine                       -> my_playlists
/// GET /featured                   -> featured_playlists
/// GET /categories/{category_id}   -> category_playlists
/// GET /{spotify_id}               -> get_playlist
/// GET /{spotify_id}/tracks        -> playlist_tracks
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(playlists::my_playlists))
        .route("/featured", get(playlists::featured_playlists))
        .route(
            "/categories/{category_id}",
            get(playlists::category_playlists),
        )
        .route("/{spotify_id}", get(playlists::get_playlist))
        .route("/{spotify_id}/tracks", get(playlists::playlist_tracks))
}
