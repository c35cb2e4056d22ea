use axum::routing::get;
use axum::Router;

use crate::handlers::cron;
use crate::state::AppState;

/// Routes mounted at `/cron`.
///
/// ```text
/// GET|POST /sync   -> run_sync (?force&user_id&playlist_id&source_id)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/sync", get(cron::run_sync).post(cron::run_sync))
}
