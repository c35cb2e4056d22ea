//! Handlers for managed (destination) playlists and their sync settings.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use playlistfox_core::audit::{actions, entity_types};
use playlistfox_core::error::CoreError;
use playlistfox_core::scheduling::{
    next_sync_at, validate_quantity, CustomSchedule, SyncInterval, SyncMode,
    DEFAULT_QUANTITY_PER_SOURCE,
};
use playlistfox_core::types::{DbId, Timestamp};
use playlistfox_db::models::audit::CreateAuditLog;
use playlistfox_db::models::managed_playlist::{ManagedPlaylist, SyncSettings};
use playlistfox_db::models::subscription::SubscriptionDetail;
use playlistfox_db::repositories::{ManagedPlaylistRepo, SubscriptionRepo};
use playlistfox_sync::{SyncRequest, SyncSummary};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::audit::{self, snapshot};
use crate::handlers::run_sync_detached;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A managed playlist together with its live source subscriptions.
#[derive(Debug, Serialize)]
pub struct ManagedPlaylistWithSources {
    #[serde(flatten)]
    pub playlist: ManagedPlaylist,
    pub sources: Vec<SubscriptionDetail>,
}

/// Sync settings as submitted by a client. Absent fields take defaults on
/// create and keep their current value on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncSettingsInput {
    pub sync_interval: Option<String>,
    pub sync_quantity_per_source: Option<i32>,
    pub sync_mode: Option<String>,
    pub custom_days: Option<Vec<String>>,
    pub custom_time: Option<String>,
    pub content_filters: Option<serde_json::Value>,
}

impl SyncSettingsInput {
    /// Fill absent fields from a stored playlist.
    fn or_current(self, current: &ManagedPlaylist) -> Self {
        Self {
            sync_interval: self
                .sync_interval
                .or_else(|| Some(current.sync_interval.clone())),
            sync_quantity_per_source: self
                .sync_quantity_per_source
                .or(Some(current.sync_quantity_per_source)),
            sync_mode: self.sync_mode.or_else(|| Some(current.sync_mode.clone())),
            custom_days: self.custom_days.or_else(|| current.custom_days.clone()),
            custom_time: self.custom_time.or_else(|| current.custom_time.clone()),
            content_filters: self
                .content_filters
                .or_else(|| current.content_filters.clone()),
        }
    }
}

/// Validate settings and compute the first `next_sync_at` after `now`.
///
/// Interval defaults to daily, mode to append. Custom days and time are
/// kept only for the custom interval.
pub fn resolve_settings(
    input: &SyncSettingsInput,
    now: Timestamp,
) -> Result<SyncSettings, CoreError> {
    let interval: SyncInterval = match input.sync_interval.as_deref() {
        Some(raw) => raw.parse()?,
        None => SyncInterval::Daily,
    };
    let mode: SyncMode = match input.sync_mode.as_deref() {
        Some(raw) => raw.parse()?,
        None => SyncMode::Append,
    };
    let quantity = validate_quantity(
        input
            .sync_quantity_per_source
            .unwrap_or(DEFAULT_QUANTITY_PER_SOURCE),
    )?;

    let schedule = match interval {
        SyncInterval::Custom => {
            let days = input.custom_days.as_deref().unwrap_or(&[]);
            let time = input.custom_time.as_deref().ok_or_else(|| {
                CoreError::Validation("CUSTOM interval requires custom_time (HH:MM)".into())
            })?;
            Some(CustomSchedule::parse(days, time)?)
        }
        _ => None,
    };

    let content_filters = match &input.content_filters {
        None | Some(serde_json::Value::Null) => None,
        Some(filters @ serde_json::Value::Object(_)) => Some(filters.clone()),
        Some(_) => {
            return Err(CoreError::Validation(
                "content_filters must be a JSON object".into(),
            ))
        }
    };

    Ok(SyncSettings {
        sync_interval: interval.as_str().to_string(),
        sync_quantity_per_source: quantity,
        sync_mode: mode.as_str().to_string(),
        custom_days: schedule.as_ref().map(CustomSchedule::day_names),
        custom_time: schedule.as_ref().map(CustomSchedule::time_string),
        content_filters,
        next_sync_at: next_sync_at(interval, schedule.as_ref(), now)?,
    })
}

/// Whether new settings change when the playlist runs.
fn schedule_changed(settings: &SyncSettings, current: &ManagedPlaylist) -> bool {
    settings.sync_interval != current.sync_interval
        || settings.custom_days != current.custom_days
        || settings.custom_time != current.custom_time
}

async fn find_owned(state: &AppState, id: DbId, auth: &AuthUser) -> AppResult<ManagedPlaylist> {
    Ok(ManagedPlaylistRepo::find_for_user(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("ManagedPlaylist", id))?)
}

/// GET /api/v1/managed-playlists/{id}
pub async fn get_managed_playlist(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ManagedPlaylistWithSources>>> {
    let playlist = find_owned(&state, id, &auth).await?;
    let sources = SubscriptionRepo::list_for_managed(&state.pool, &[playlist.id]).await?;
    Ok(Json(DataResponse {
        data: ManagedPlaylistWithSources { playlist, sources },
    }))
}

/// PUT /api/v1/managed-playlists/{id}
///
/// Partial update of sync settings. `next_sync_at` is recomputed from now
/// only when the interval or custom schedule changes.
pub async fn update_managed_playlist(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SyncSettingsInput>,
) -> AppResult<Json<DataResponse<ManagedPlaylist>>> {
    let current = find_owned(&state, id, &auth).await?;

    let mut settings = resolve_settings(&input.or_current(&current), Utc::now())?;
    if !schedule_changed(&settings, &current) {
        if let Some(existing) = current.next_sync_at {
            settings.next_sync_at = existing;
        }
    }

    let updated = ManagedPlaylistRepo::update_settings(&state.pool, id, auth.user_id, &settings)
        .await?
        .ok_or_else(|| CoreError::not_found("ManagedPlaylist", id))?;

    tracing::info!(
        managed_playlist_id = id,
        user_id = auth.user_id,
        interval = %updated.sync_interval,
        next_sync_at = ?updated.next_sync_at,
        "Sync settings updated",
    );

    audit::record(
        &state.pool,
        CreateAuditLog {
            user_id: Some(auth.user_id),
            action: actions::UPDATE,
            entity_type: entity_types::MANAGED_PLAYLIST,
            entity_id: Some(id),
            old_values: snapshot(&current),
            new_values: snapshot(&updated),
        },
    )
    .await;

    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/managed-playlists/{id}/sync
///
/// Sync one owned destination now, regardless of its schedule. Waits for a
/// run already in progress. Mounted outside the request timeout.
pub async fn sync_managed_playlist(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SyncSummary>>> {
    let playlist = find_owned(&state, id, &auth).await?;

    let request = SyncRequest {
        force: true,
        user_id: Some(auth.external_id.clone()),
        playlist_id: Some(playlist.spotify_playlist_id.clone()),
        source_id: None,
    };
    let summary = run_sync_detached(&state, request).await?;

    tracing::info!(
        managed_playlist_id = id,
        run_id = %summary.run_id,
        tracks_added = summary.tracks_added,
        "Manual sync finished",
    );
    Ok(Json(DataResponse { data: summary }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn now() -> Timestamp {
        // A Tuesday.
        Utc.with_ymd_and_hms(2024, 1, 2, 15, 30, 0).unwrap()
    }

    fn stored(settings: &SyncSettings) -> ManagedPlaylist {
        ManagedPlaylist {
            id: 1,
            user_id: 1,
            spotify_playlist_id: "dest".into(),
            name: "Dest".into(),
            image_url: None,
            track_count: 0,
            sync_interval: settings.sync_interval.clone(),
            sync_quantity_per_source: settings.sync_quantity_per_source,
            sync_mode: settings.sync_mode.clone(),
            custom_days: settings.custom_days.clone(),
            custom_time: settings.custom_time.clone(),
            content_filters: settings.content_filters.clone(),
            last_synced_at: None,
            next_sync_at: Some(settings.next_sync_at),
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn empty_input_takes_defaults() {
        let settings = resolve_settings(&SyncSettingsInput::default(), now()).unwrap();
        assert_eq!(settings.sync_interval, "DAILY");
        assert_eq!(settings.sync_mode, "APPEND");
        assert_eq!(settings.sync_quantity_per_source, 5);
        assert_eq!(settings.custom_days, None);
        assert_eq!(settings.next_sync_at, Utc.with_ymd_and_hms(2024, 1, 3, 15, 30, 0).unwrap());
    }

    #[test]
    fn custom_schedule_is_normalized() {
        let input = SyncSettingsInput {
            sync_interval: Some("custom".into()),
            custom_days: Some(vec!["Fri".into(), "monday".into()]),
            custom_time: Some("09:00".into()),
            ..Default::default()
        };
        let settings = resolve_settings(&input, now()).unwrap();
        assert_eq!(settings.sync_interval, "CUSTOM");
        assert_eq!(
            settings.custom_days,
            Some(vec!["monday".to_string(), "friday".to_string()])
        );
        assert_eq!(settings.custom_time.as_deref(), Some("09:00"));
        assert_eq!(settings.next_sync_at, Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap());
    }

    #[test]
    fn custom_without_days_or_time_is_invalid() {
        let no_days = SyncSettingsInput {
            sync_interval: Some("CUSTOM".into()),
            custom_time: Some("09:00".into()),
            ..Default::default()
        };
        assert_matches!(resolve_settings(&no_days, now()), Err(CoreError::Validation(_)));

        let no_time = SyncSettingsInput {
            sync_interval: Some("CUSTOM".into()),
            custom_days: Some(vec!["monday".into()]),
            ..Default::default()
        };
        assert_matches!(resolve_settings(&no_time, now()), Err(CoreError::Validation(_)));
    }

    #[test]
    fn custom_fields_are_dropped_for_fixed_intervals() {
        let input = SyncSettingsInput {
            sync_interval: Some("WEEKLY".into()),
            custom_days: Some(vec!["monday".into()]),
            custom_time: Some("09:00".into()),
            ..Default::default()
        };
        let settings = resolve_settings(&input, now()).unwrap();
        assert_eq!(settings.custom_days, None);
        assert_eq!(settings.custom_time, None);
    }

    #[test]
    fn out_of_range_quantity_and_bad_filters_are_invalid() {
        let quantity = SyncSettingsInput {
            sync_quantity_per_source: Some(101),
            ..Default::default()
        };
        assert_matches!(resolve_settings(&quantity, now()), Err(CoreError::Validation(_)));

        let filters = SyncSettingsInput {
            content_filters: Some(serde_json::json!(["explicit"])),
            ..Default::default()
        };
        assert_matches!(resolve_settings(&filters, now()), Err(CoreError::Validation(_)));
    }

    #[test]
    fn quantity_only_update_keeps_schedule() {
        let current = stored(&resolve_settings(&SyncSettingsInput::default(), now()).unwrap());
        let input = SyncSettingsInput {
            sync_quantity_per_source: Some(20),
            ..Default::default()
        }
        .or_current(&current);
        let settings = resolve_settings(&input, now()).unwrap();
        assert_eq!(settings.sync_quantity_per_source, 20);
        assert!(!schedule_changed(&settings, &current));
    }

    #[test]
    fn interval_change_is_a_schedule_change() {
        let current = stored(&resolve_settings(&SyncSettingsInput::default(), now()).unwrap());
        let input = SyncSettingsInput {
            sync_interval: Some("MONTHLY".into()),
            ..Default::default()
        }
        .or_current(&current);
        let settings = resolve_settings(&input, now()).unwrap();
        assert!(schedule_changed(&settings, &current));
    }
}
