//! Source playlist entity model and DTOs.

use playlistfox_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A playlist tracks are pulled from. Shared by every subscriber.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SourcePlaylist {
    pub id: DbId,
    pub spotify_playlist_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertSourcePlaylist {
    pub spotify_playlist_id: String,
    pub name: String,
    pub image_url: Option<String>,
}
