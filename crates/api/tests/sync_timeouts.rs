//! Integration tests for request and upstream timeouts around sync runs.

mod common;

use std::net::TcpListener;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use playlistfox_core::types::DbId;
use common::{authed, body_json, send, CRON_SECRET};
use playlistfox_db::models::managed_playlist::{CreateManagedPlaylist, SyncSettings};
use playlistfox_db::models::source_playlist::UpsertSourcePlaylist;
use playlistfox_db::models::subscription::NewSubscription;
use playlistfox_db::models::user::UpsertUser;
use playlistfox_db::repositories::{ManagedPlaylistRepo, SubscriptionRepo, UserRepo};
use sqlx::PgPool;

/// A socket that accepts connections (through the kernel backlog) and never
/// answers, standing in for a hung upstream.
fn silent_upstream() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    (listener, url)
}

/// Identity provider and Spotify stand-in: hands out a token and serves
/// empty playlists, each listing taking `delay`.
async fn slow_upstream(delay: Duration) -> String {
    let app = Router::new()
        .route(
            "/users/{id}/oauth_access_tokens/oauth_spotify",
            get(|| async {
                Json(serde_json::json!([
                    {"token": "spotify-token", "provider": "oauth_spotify", "scopes": []}
                ]))
            }),
        )
        .route(
            "/playlists/{id}/tracks",
            get(move || async move {
                tokio::time::sleep(delay).await;
                Json(serde_json::json!({"items": [], "next": null}))
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    url
}

async fn seed_due_destination(pool: &PgPool, external_id: &str) -> DbId {
    let user = UserRepo::upsert(
        pool,
        &UpsertUser {
            external_id: external_id.to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    SubscriptionRepo::subscribe(
        pool,
        &NewSubscription {
            managed: CreateManagedPlaylist {
                user_id: user.id,
                spotify_playlist_id: "dest".to_string(),
                name: "Dest".to_string(),
                image_url: None,
                track_count: 0,
                settings: SyncSettings {
                    sync_interval: "DAILY".to_string(),
                    sync_quantity_per_source: 5,
                    sync_mode: "APPEND".to_string(),
                    custom_days: None,
                    custom_time: None,
                    content_filters: None,
                    next_sync_at: Utc::now(),
                },
            },
            sources: vec![UpsertSourcePlaylist {
                spotify_playlist_id: "src".to_string(),
                name: "Source".to_string(),
                image_url: None,
            }],
        },
    )
    .await
    .unwrap()
    .managed_playlist
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cron_sync_outlasts_the_request_timeout(pool: PgPool) {
    let (_upstream, url) = silent_upstream();
    let mut config = common::test_config();
    config.request_timeout_secs = 1;
    config.upstream_timeout_secs = 2;
    config.identity.api_url = url;
    seed_due_destination(&pool, "user_1").await;

    let app = common::build_test_app_with(pool, config);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/cron/sync?force=true")
        .header("authorization", format!("Bearer {CRON_SECRET}"))
        .body(Body::empty())
        .unwrap();

    // The token lookup hangs until the upstream timeout, past the 1 s
    // request timeout; the run still reports its summary.
    let response = tokio::time::timeout(Duration::from_secs(20), send(app, request))
        .await
        .expect("upstream timeout must end the run");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["failed"], 1);
    assert_eq!(json["data"]["tracks_added"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn other_routes_keep_the_request_timeout(pool: PgPool) {
    let (_upstream, url) = silent_upstream();
    let mut config = common::test_config();
    config.request_timeout_secs = 1;
    config.upstream_timeout_secs = 10;
    config.identity.api_url = url;

    let app = common::build_test_app_with(pool, config);
    let response = authed(app, Method::GET, "/api/v1/token", "user_1", None).await;

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn hung_identity_provider_surfaces_as_upstream_error(pool: PgPool) {
    let (_upstream, url) = silent_upstream();
    let mut config = common::test_config();
    config.request_timeout_secs = 30;
    config.upstream_timeout_secs = 1;
    config.identity.api_url = url;

    let app = common::build_test_app_with(pool, config);
    let response = authed(app, Method::GET, "/api/v1/token", "user_1", None).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UPSTREAM_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dropped_cron_request_does_not_cancel_the_run(pool: PgPool) {
    let url = slow_upstream(Duration::from_millis(500)).await;
    let mut config = common::test_config();
    config.spotify_api_url = url.clone();
    config.identity.api_url = url;
    let managed_id = seed_due_destination(&pool, "user_1").await;
    let before = Utc::now();

    let app = common::build_test_app_with(pool.clone(), config);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/cron/sync?force=true")
        .header("authorization", format!("Bearer {CRON_SECRET}"))
        .body(Body::empty())
        .unwrap();

    // The client gives up while the destination is still being listed.
    let abandoned = tokio::time::timeout(Duration::from_millis(200), send(app, request)).await;
    assert!(abandoned.is_err());

    // Both listings come back empty, so the destination is marked synced.
    let mut synced = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let playlist = ManagedPlaylistRepo::find_by_id(&pool, managed_id)
            .await
            .unwrap()
            .unwrap();
        if playlist.last_synced_at.is_some() {
            synced = Some(playlist);
            break;
        }
    }

    let playlist = synced.expect("run should finish after the request was dropped");
    assert!(playlist.last_synced_at.unwrap() >= before);
    assert!(playlist.next_sync_at.unwrap() > before);
}
