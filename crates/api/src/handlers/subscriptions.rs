//! Handlers for source subscriptions.
//!
//! Subscribing creates the managed and source rows on first use; the last
//! unsubscribe from either side soft-deletes it (see
//! [`SubscriptionRepo::delete_with_orphan_cleanup`]).

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use playlistfox_core::audit::{actions, entity_types};
use playlistfox_core::error::CoreError;
use playlistfox_core::types::DbId;
use playlistfox_db::models::audit::CreateAuditLog;
use playlistfox_db::models::managed_playlist::CreateManagedPlaylist;
use playlistfox_db::models::source_playlist::UpsertSourcePlaylist;
use playlistfox_db::models::subscription::{NewSubscription, SubscriptionDetail};
use playlistfox_db::repositories::{ManagedPlaylistRepo, SubscriptionRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::audit::{self, snapshot};
use crate::handlers::managed_playlists::{resolve_settings, ManagedPlaylistWithSources, SyncSettingsInput};
use crate::handlers::spotify_token;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Most sources accepted in one subscribe request.
const MAX_SOURCES_PER_REQUEST: usize = 20;

/// Body of `POST /subscriptions`.
#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Spotify id of the destination playlist.
    pub playlist_id: String,
    /// Spotify ids of the source playlists.
    pub source_playlist_ids: Vec<String>,
    /// Settings applied when the destination is new to PlaylistFox.
    #[serde(flatten)]
    pub settings: SyncSettingsInput,
}

/// Trimmed, de-duplicated source ids, in request order.
fn normalize_sources(
    destination: &str,
    sources: &[String],
) -> Result<Vec<String>, CoreError> {
    let mut ids: Vec<String> = Vec::new();
    for id in sources.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if id == destination {
            return Err(CoreError::Validation(
                "A playlist cannot be subscribed to itself".into(),
            ));
        }
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    if ids.is_empty() {
        return Err(CoreError::Validation(
            "At least one source playlist is required".into(),
        ));
    }
    if ids.len() > MAX_SOURCES_PER_REQUEST {
        return Err(CoreError::Validation(format!(
            "At most {MAX_SOURCES_PER_REQUEST} sources per request"
        )));
    }
    Ok(ids)
}

/// GET /api/v1/subscriptions
///
/// The caller's managed playlists, each with its live sources.
pub async fn list_subscriptions(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ManagedPlaylistWithSources>>>> {
    let playlists = ManagedPlaylistRepo::list_for_user(&state.pool, auth.user_id).await?;
    let ids: Vec<DbId> = playlists.iter().map(|p| p.id).collect();

    let mut by_playlist: HashMap<DbId, Vec<SubscriptionDetail>> = HashMap::new();
    for detail in SubscriptionRepo::list_for_managed(&state.pool, &ids).await? {
        by_playlist
            .entry(detail.managed_playlist_id)
            .or_default()
            .push(detail);
    }

    let data = playlists
        .into_iter()
        .map(|playlist| {
            let sources = by_playlist.remove(&playlist.id).unwrap_or_default();
            ManagedPlaylistWithSources { playlist, sources }
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/subscriptions
///
/// Subscribe a destination to one or more sources. Playlist names and
/// artwork are read from Spotify. Re-subscribing an existing pair returns
/// the existing subscription; settings of an existing destination are left
/// untouched (use `PUT /managed-playlists/{id}`).
pub async fn create_subscription(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSubscriptionRequest>,
) -> AppResult<impl IntoResponse> {
    let destination_id = input.playlist_id.trim();
    if destination_id.is_empty() {
        return Err(AppError::BadRequest("playlist_id must not be empty".into()));
    }
    let source_ids = normalize_sources(destination_id, &input.source_playlist_ids)?;
    let settings = resolve_settings(&input.settings, Utc::now())?;

    let token = spotify_token(&state, &auth).await?;
    let destination = state.spotify.playlist(&token, destination_id).await?;

    let mut sources = Vec::with_capacity(source_ids.len());
    for source_id in &source_ids {
        let source = state.spotify.playlist(&token, source_id).await?;
        sources.push(UpsertSourcePlaylist {
            spotify_playlist_id: source.id.clone(),
            name: source.name.clone(),
            image_url: source.cover_url().map(str::to_string),
        });
    }

    let outcome = SubscriptionRepo::subscribe(
        &state.pool,
        &NewSubscription {
            managed: CreateManagedPlaylist {
                user_id: auth.user_id,
                spotify_playlist_id: destination.id.clone(),
                name: destination.name.clone(),
                image_url: destination.cover_url().map(str::to_string),
                track_count: i32::try_from(destination.tracks.total).unwrap_or(i32::MAX),
                settings,
            },
            sources,
        },
    )
    .await?;

    tracing::info!(
        managed_playlist_id = outcome.managed_playlist.id,
        user_id = auth.user_id,
        sources = outcome.subscriptions.len(),
        created = outcome.created_managed_playlist,
        "Subscriptions created",
    );

    if outcome.created_managed_playlist {
        audit::record(
            &state.pool,
            CreateAuditLog {
                user_id: Some(auth.user_id),
                action: actions::CREATE,
                entity_type: entity_types::MANAGED_PLAYLIST,
                entity_id: Some(outcome.managed_playlist.id),
                old_values: None,
                new_values: snapshot(&outcome.managed_playlist),
            },
        )
        .await;
    }
    for subscription in &outcome.subscriptions {
        audit::record(
            &state.pool,
            CreateAuditLog {
                user_id: Some(auth.user_id),
                action: actions::SUBSCRIBE,
                entity_type: entity_types::SUBSCRIPTION,
                entity_id: Some(subscription.id),
                old_values: None,
                new_values: snapshot(subscription),
            },
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

/// GET /api/v1/subscriptions/{id}
pub async fn get_subscription(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SubscriptionDetail>>> {
    let subscription = SubscriptionRepo::find_for_user(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Subscription", id))?;
    Ok(Json(DataResponse { data: subscription }))
}

/// DELETE /api/v1/subscriptions/{id}
///
/// Soft-deletes the subscription, then any managed or source playlist left
/// without live subscriptions.
pub async fn delete_subscription(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let outcome = SubscriptionRepo::delete_with_orphan_cleanup(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Subscription", id))?;

    tracing::info!(
        subscription_id = id,
        user_id = auth.user_id,
        managed_playlist_deleted = outcome.managed_playlist_deleted,
        source_playlist_deleted = outcome.source_playlist_deleted,
        "Subscription removed",
    );

    let subscription = &outcome.subscription;
    audit::record(
        &state.pool,
        CreateAuditLog {
            user_id: Some(auth.user_id),
            action: actions::UNSUBSCRIBE,
            entity_type: entity_types::SUBSCRIPTION,
            entity_id: Some(subscription.id),
            old_values: snapshot(subscription),
            new_values: None,
        },
    )
    .await;
    if outcome.managed_playlist_deleted {
        audit::record(
            &state.pool,
            CreateAuditLog {
                user_id: Some(auth.user_id),
                action: actions::DELETE,
                entity_type: entity_types::MANAGED_PLAYLIST,
                entity_id: Some(subscription.managed_playlist_id),
                old_values: None,
                new_values: None,
            },
        )
        .await;
    }
    if outcome.source_playlist_deleted {
        audit::record(
            &state.pool,
            CreateAuditLog {
                user_id: Some(auth.user_id),
                action: actions::DELETE,
                entity_type: entity_types::SOURCE_PLAYLIST,
                entity_id: Some(subscription.source_playlist_id),
                old_values: None,
                new_values: None,
            },
        )
        .await;
    }

    Ok(Json(DataResponse { data: outcome }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sources_are_trimmed_and_deduplicated() {
        let normalized = normalize_sources("dest", &ids(&[" a ", "b", "a", ""])).unwrap();
        assert_eq!(normalized, ids(&["a", "b"]));
    }

    #[test]
    fn self_subscription_is_rejected() {
        assert_matches!(
            normalize_sources("dest", &ids(&["a", "dest"])),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn empty_and_oversized_source_lists_are_rejected() {
        assert_matches!(normalize_sources("dest", &ids(&[" "])), Err(CoreError::Validation(_)));

        let many: Vec<String> = (0..=MAX_SOURCES_PER_REQUEST).map(|i| format!("s{i}")).collect();
        assert_matches!(normalize_sources("dest", &many), Err(CoreError::Validation(_)));
    }

    #[test]
    fn settings_are_read_from_the_flattened_body() {
        let body: CreateSubscriptionRequest = serde_json::from_value(serde_json::json!({
            "playlist_id": "dest",
            "source_playlist_ids": ["a"],
            "sync_interval": "WEEKLY",
            "sync_quantity_per_source": 10
        }))
        .unwrap();
        assert_eq!(body.settings.sync_interval.as_deref(), Some("WEEKLY"));
        assert_eq!(body.settings.sync_quantity_per_source, Some(10));
    }
}
