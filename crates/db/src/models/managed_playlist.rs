//! Managed (destination) playlist entity model and DTOs.
//!
//! Interval and mode are stored as text and parsed through
//! `playlistfox_core::scheduling` at the edges.

use playlistfox_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A destination playlist owned by one user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ManagedPlaylist {
    pub id: DbId,
    pub user_id: DbId,
    pub spotify_playlist_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub track_count: i32,
    pub sync_interval: String,
    pub sync_quantity_per_source: i32,
    pub sync_mode: String,
    pub custom_days: Option<Vec<String>>,
    pub custom_time: Option<String>,
    pub content_filters: Option<serde_json::Value>,
    pub last_synced_at: Option<Timestamp>,
    pub next_sync_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Sync settings as persisted. Callers resolve and validate them first.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    pub sync_interval: String,
    pub sync_quantity_per_source: i32,
    pub sync_mode: String,
    pub custom_days: Option<Vec<String>>,
    pub custom_time: Option<String>,
    pub content_filters: Option<serde_json::Value>,
    pub next_sync_at: Timestamp,
}

/// DTO for creating a managed playlist on first subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateManagedPlaylist {
    pub user_id: DbId,
    pub spotify_playlist_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub track_count: i32,
    pub settings: SyncSettings,
}

/// Cached display metadata refreshed after a sync adds tracks.
#[derive(Debug, Clone)]
pub struct PlaylistMetadata {
    pub name: String,
    pub image_url: Option<String>,
    pub track_count: i32,
}

/// Narrowing applied when selecting destinations for a sync run.
#[derive(Debug, Clone, Default)]
pub struct DueFilter {
    /// Ignore `next_sync_at` and take every live destination.
    pub force: bool,
    /// Identity-provider id of the owning user.
    pub user_external_id: Option<String>,
    /// Spotify id of the destination playlist.
    pub spotify_playlist_id: Option<String>,
    /// Spotify id of a source; only destinations subscribed to it match.
    pub source_spotify_playlist_id: Option<String>,
}

/// A destination selected for syncing, joined with its owner's external id.
#[derive(Debug, Clone, FromRow)]
pub struct DueManagedPlaylist {
    pub id: DbId,
    pub user_id: DbId,
    pub owner_external_id: String,
    pub spotify_playlist_id: String,
    pub sync_interval: String,
    pub sync_quantity_per_source: i32,
    pub custom_days: Option<Vec<String>>,
    pub custom_time: Option<String>,
}
