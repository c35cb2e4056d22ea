//! Shared helpers for API integration tests.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use playlistfox_api::auth::session::SessionClaims;
use playlistfox_api::config::{IdentityConfig, ServerConfig};
use playlistfox_api::router::build_app_router;
use playlistfox_api::state::AppState;
use playlistfox_sync::SyncConfig;
use sqlx::PgPool;
use tower::ServiceExt;

pub const SESSION_PRIVATE_PEM: &str = include_str!("../fixtures/session_private.pem");
pub const SESSION_PUBLIC_PEM: &str = include_str!("../fixtures/session_public.pem");

pub const CRON_SECRET: &str = "test-cron-secret";

/// `whsec_` + base64("playlistfox-test-webhook-key").
pub const WEBHOOK_SECRET: &str = "whsec_cGxheWxpc3Rmb3gtdGVzdC13ZWJob29rLWtleQ==";

/// Nothing listens here; tests must not reach upstream services.
const UNREACHABLE: &str = "http://127.0.0.1:9";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upstream_timeout_secs: 5,
        app_env: "test".to_string(),
        cron_secret: CRON_SECRET.to_string(),
        spotify_api_url: UNREACHABLE.to_string(),
        identity: IdentityConfig {
            api_url: UNREACHABLE.to_string(),
            secret_key: "sk_test".to_string(),
            jwt_public_key: SESSION_PUBLIC_PEM.to_string(),
            webhook_secret: WEBHOOK_SECRET.to_string(),
        },
        sync: SyncConfig::default(),
        scheduler_interval: None,
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Build the router from a customized config.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    build_app_router(AppState::new(pool, config))
}

/// Sign a session token for `sub` with the test key.
pub fn session_token(sub: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: sub.to_string(),
        exp: now + 600,
        iat: Some(now),
        email: Some(format!("{sub}@example.com")),
        name: Some("Test User".to_string()),
        picture: None,
    };
    let key = EncodingKey::from_rsa_pem(SESSION_PRIVATE_PEM.as_bytes()).unwrap();
    encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

/// Send an authenticated request as `sub`, with an optional JSON body.
pub async fn authed(
    app: Router,
    method: Method,
    uri: &str,
    sub: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", session_token(sub)));
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
