//! Routes for the caller's own account and Spotify profile data.

use axum::routing::get;
use axum::Router;

use crate::handlers::{me, search};
use crate::state::AppState;

/// Routes merged at the `/api/v1` root.
///
/// ```text
/// GET /me               -> get_me
/// GET /me/top-artists   -> top_artists
/// GET /token            -> get_token
/// GET /search           -> search
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me::get_me))
        .route("/me/top-artists", get(me::top_artists))
        .route("/token", get(me::get_token))
        .route("/search", get(search::search))
}
