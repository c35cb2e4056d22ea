//! Persistence seen by a sync run, and its Postgres implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use playlistfox_core::scheduling::{CustomSchedule, SyncInterval};
use playlistfox_core::types::{DbId, Timestamp};
use playlistfox_db::models::managed_playlist::{DueFilter, DueManagedPlaylist, PlaylistMetadata};
use playlistfox_db::repositories::{ManagedPlaylistRepo, SubscriptionRepo};
use playlistfox_db::DbPool;

use crate::error::SyncError;

/// One subscription to pull from.
#[derive(Debug, Clone)]
pub struct SourceRef {
    pub subscription_id: DbId,
    pub spotify_playlist_id: String,
}

/// A destination selected for syncing, with everything reconciliation needs.
#[derive(Debug, Clone)]
pub struct SyncTarget {
    pub managed_playlist_id: DbId,
    pub owner_external_id: String,
    pub spotify_playlist_id: String,
    pub quantity_per_source: usize,
    pub interval: SyncInterval,
    /// Set when `interval` is `Custom`.
    pub schedule: Option<CustomSchedule>,
    /// Live subscriptions, oldest first.
    pub sources: Vec<SourceRef>,
}

#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Destinations matching `filter` that are due at `now`.
    async fn due_targets(&self, filter: &DueFilter, now: Timestamp)
        -> Result<Vec<SyncTarget>, SyncError>;

    async fn mark_subscription_synced(&self, subscription_id: DbId, at: Timestamp)
        -> Result<(), SyncError>;

    async fn update_metadata(
        &self,
        managed_playlist_id: DbId,
        metadata: &PlaylistMetadata,
    ) -> Result<(), SyncError>;

    async fn mark_destination_synced(
        &self,
        managed_playlist_id: DbId,
        synced_at: Timestamp,
        next_sync_at: Timestamp,
    ) -> Result<(), SyncError>;
}

/// [`SyncStore`] backed by the Postgres repositories.
#[derive(Debug, Clone)]
pub struct PgSyncStore {
    pool: DbPool,
}

impl PgSyncStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStore for PgSyncStore {
    async fn due_targets(
        &self,
        filter: &DueFilter,
        now: Timestamp,
    ) -> Result<Vec<SyncTarget>, SyncError> {
        let rows = ManagedPlaylistRepo::list_due(&self.pool, filter, now).await?;
        let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
        let sources = SubscriptionRepo::list_sync_sources(
            &self.pool,
            &ids,
            filter.source_spotify_playlist_id.as_deref(),
        )
        .await?;

        let mut by_destination: HashMap<DbId, Vec<SourceRef>> = HashMap::new();
        for source in sources {
            by_destination
                .entry(source.managed_playlist_id)
                .or_default()
                .push(SourceRef {
                    subscription_id: source.subscription_id,
                    spotify_playlist_id: source.source_spotify_playlist_id,
                });
        }

        let targets = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                let sources = by_destination.remove(&id).unwrap_or_default();
                match to_target(row, sources) {
                    Ok(target) => Some(target),
                    Err(e) => {
                        tracing::error!(
                            managed_playlist_id = id,
                            error = %e,
                            "Skipping destination with invalid sync settings",
                        );
                        None
                    }
                }
            })
            .collect();
        Ok(targets)
    }

    async fn mark_subscription_synced(
        &self,
        subscription_id: DbId,
        at: Timestamp,
    ) -> Result<(), SyncError> {
        SubscriptionRepo::mark_synced(&self.pool, subscription_id, at).await?;
        Ok(())
    }

    async fn update_metadata(
        &self,
        managed_playlist_id: DbId,
        metadata: &PlaylistMetadata,
    ) -> Result<(), SyncError> {
        ManagedPlaylistRepo::update_metadata(&self.pool, managed_playlist_id, metadata).await?;
        Ok(())
    }

    async fn mark_destination_synced(
        &self,
        managed_playlist_id: DbId,
        synced_at: Timestamp,
        next_sync_at: Timestamp,
    ) -> Result<(), SyncError> {
        ManagedPlaylistRepo::mark_synced(&self.pool, managed_playlist_id, synced_at, next_sync_at)
            .await?;
        Ok(())
    }
}

/// Parse the stored interval and schedule columns of a due row.
fn to_target(row: DueManagedPlaylist, sources: Vec<SourceRef>) -> Result<SyncTarget, SyncError> {
    let interval: SyncInterval = row.sync_interval.parse()?;
    let schedule = match (interval, &row.custom_days, &row.custom_time) {
        (SyncInterval::Custom, Some(days), Some(time)) => {
            Some(CustomSchedule::parse(days.as_slice(), time)?)
        }
        _ => None,
    };
    Ok(SyncTarget {
        managed_playlist_id: row.id,
        owner_external_id: row.owner_external_id,
        spotify_playlist_id: row.spotify_playlist_id,
        quantity_per_source: usize::try_from(row.sync_quantity_per_source).unwrap_or(0),
        interval,
        schedule,
        sources,
    })
}
