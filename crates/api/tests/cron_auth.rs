//! Integration tests for the cron sync trigger.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, send, CRON_SECRET};
use sqlx::PgPool;

fn cron_request(method: Method, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(secret) = bearer {
        builder = builder.header("authorization", format!("Bearer {secret}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_secret_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = send(app, cron_request(Method::GET, "/api/v1/cron/sync", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_secret_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = send(
        app,
        cron_request(Method::POST, "/api/v1/cron/sync", Some("not-the-secret")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn valid_secret_runs_an_empty_sync(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = send(
        app,
        cron_request(Method::GET, "/api/v1/cron/sync?force=true", Some(CRON_SECRET)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 0);
    assert_eq!(json["data"]["tracks_added"], 0);
    assert!(json["data"]["run_id"].is_string());
    assert_eq!(json["data"]["results"], serde_json::json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn post_with_filters_is_accepted(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = send(
        app,
        cron_request(
            Method::POST,
            "/api/v1/cron/sync?user_id=user_1&playlist_id=dest&source_id=src",
            Some(CRON_SECRET),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 0);
}
