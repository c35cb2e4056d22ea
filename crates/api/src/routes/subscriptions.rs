use axum::routing::get;
use axum::Router;

use crate::handlers::subscriptions;
use crate::state::AppState;

/// Routes mounted at `/subscriptions`.
///
/// ```text
/// GET    /       -> list_subscriptions
/// POST   /       -> create_subscription
/// GET    /{id}   -> get_subscription
/// DELETE /{id}   -> delete_subscription
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(subscriptions::list_subscriptions).post(subscriptions::create_subscription),
        )
        .route(
            "/{id}",
            get(subscriptions::get_subscription).delete(subscriptions::delete_subscription),
        )
}
