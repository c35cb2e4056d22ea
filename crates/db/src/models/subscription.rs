//! Subscription entity model and DTOs.

use playlistfox_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::managed_playlist::{CreateManagedPlaylist, ManagedPlaylist};
use crate::models::source_playlist::{SourcePlaylist, UpsertSourcePlaylist};

/// A row from `managed_playlist_source_subscriptions`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subscription {
    pub id: DbId,
    pub managed_playlist_id: DbId,
    pub source_playlist_id: DbId,
    pub last_synced_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A subscription joined with its source playlist, as shown to the owner.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubscriptionDetail {
    pub id: DbId,
    pub managed_playlist_id: DbId,
    pub source_playlist_id: DbId,
    pub source_spotify_playlist_id: String,
    pub source_name: String,
    pub source_image_url: Option<String>,
    pub last_synced_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// The minimum a sync run needs per subscription.
#[derive(Debug, Clone, FromRow)]
pub struct SyncSource {
    pub subscription_id: DbId,
    pub managed_playlist_id: DbId,
    pub source_spotify_playlist_id: String,
}

/// Input for subscribing a destination to one or more sources.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    /// Used only when the caller has no live managed row for this playlist.
    pub managed: CreateManagedPlaylist,
    pub sources: Vec<UpsertSourcePlaylist>,
}

/// Result of [`crate::repositories::SubscriptionRepo::subscribe`].
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeOutcome {
    pub managed_playlist: ManagedPlaylist,
    pub created_managed_playlist: bool,
    pub sources: Vec<SourcePlaylist>,
    pub subscriptions: Vec<Subscription>,
}

/// Result of removing a subscription and any parents it orphaned.
#[derive(Debug, Clone, Serialize)]
pub struct UnsubscribeOutcome {
    pub subscription: Subscription,
    pub managed_playlist_deleted: bool,
    pub source_playlist_deleted: bool,
}
