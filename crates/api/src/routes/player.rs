use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::player;
use crate::state::AppState;

/// Routes mounted at `/player`.
///
/// ```text
/// GET  /           -> playback_state
/// GET  /devices    -> devices
/// PUT  /play       -> play (?device_id)
/// PUT  /pause      -> pause (?device_id)
/// POST /next       -> next (?device_id)
/// POST /previous   -> previous (?device_id)
/// PUT  /transfer   -> transfer
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(player::playback_state))
        .route("/devices", get(player::devices))
        .route("/play", put(player::play))
        .route("/pause", put(player::pause))
        .route("/next", post(player::next))
        .route("/previous", post(player::previous))
        .route("/transfer", put(player::transfer))
}
