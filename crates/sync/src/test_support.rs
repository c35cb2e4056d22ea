//! In-memory fakes of the sync collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use playlistfox_core::scheduling::SyncInterval;
use playlistfox_core::types::{DbId, Timestamp};
use playlistfox_db::models::managed_playlist::{DueFilter, PlaylistMetadata};
use playlistfox_spotify::SpotifyError;

use crate::catalog::TrackCatalog;
use crate::error::SyncError;
use crate::store::{SourceRef, SyncStore, SyncTarget};
use crate::token::{AccessTokenSource, TokenError};

pub fn target(id: DbId, playlist: &str, quantity: usize, sources: &[(DbId, &str)]) -> SyncTarget {
    SyncTarget {
        managed_playlist_id: id,
        owner_external_id: "user_1".to_string(),
        spotify_playlist_id: playlist.to_string(),
        quantity_per_source: quantity,
        interval: SyncInterval::Daily,
        schedule: None,
        sources: sources
            .iter()
            .map(|(sub, pl)| SourceRef {
                subscription_id: *sub,
                spotify_playlist_id: pl.to_string(),
            })
            .collect(),
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    playlists: Mutex<HashMap<String, Vec<String>>>,
    failing: HashSet<String>,
    reject_adds: bool,
    list_calls: Mutex<HashMap<String, usize>>,
    add_batches: Mutex<Vec<usize>>,
    tokens_seen: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_playlist(self, id: &str, tracks: &[&str]) -> Self {
        self.playlists
            .lock()
            .unwrap()
            .insert(id.to_string(), tracks.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn rejecting_adds(mut self) -> Self {
        self.reject_adds = true;
        self
    }

    pub fn tracks(&self, id: &str) -> Vec<String> {
        self.playlists.lock().unwrap().get(id).cloned().unwrap_or_default()
    }

    pub fn list_calls(&self, id: &str) -> usize {
        self.list_calls.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn add_batch_sizes(&self) -> Vec<usize> {
        self.add_batches.lock().unwrap().clone()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackCatalog for FakeCatalog {
    async fn playlist_track_ids(
        &self,
        token: &str,
        playlist_id: &str,
    ) -> Result<Vec<String>, SpotifyError> {
        self.tokens_seen.lock().unwrap().push(token.to_string());
        *self
            .list_calls
            .lock()
            .unwrap()
            .entry(playlist_id.to_string())
            .or_default() += 1;
        if self.failing.contains(playlist_id) {
            return Err(SpotifyError::Api {
                status: 500,
                message: "boom".into(),
            });
        }
        self.playlists
            .lock()
            .unwrap()
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| SpotifyError::NotFound(playlist_id.to_string()))
    }

    async fn add_tracks(
        &self,
        _token: &str,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyError> {
        if self.reject_adds {
            return Err(SpotifyError::Unauthorized("insufficient scope".into()));
        }
        self.add_batches.lock().unwrap().push(track_ids.len());
        self.playlists
            .lock()
            .unwrap()
            .entry(playlist_id.to_string())
            .or_default()
            .extend(track_ids.iter().cloned());
        Ok(())
    }

    async fn playlist_metadata(
        &self,
        _token: &str,
        playlist_id: &str,
    ) -> Result<PlaylistMetadata, SpotifyError> {
        let count = self.tracks(playlist_id).len();
        Ok(PlaylistMetadata {
            name: format!("Playlist {playlist_id}"),
            image_url: None,
            track_count: count as i32,
        })
    }
}

#[derive(Default)]
pub struct FakeStore {
    targets: Vec<SyncTarget>,
    synced_subscriptions: Mutex<Vec<DbId>>,
    metadata: Mutex<HashMap<DbId, PlaylistMetadata>>,
    next_sync: Mutex<HashMap<DbId, Timestamp>>,
    filters_seen: Mutex<Vec<DueFilter>>,
}

impl FakeStore {
    pub fn with_targets(targets: Vec<SyncTarget>) -> Self {
        Self {
            targets,
            ..Self::default()
        }
    }

    pub fn synced_subscriptions(&self) -> Vec<DbId> {
        self.synced_subscriptions.lock().unwrap().clone()
    }

    pub fn metadata_for(&self, id: DbId) -> Option<PlaylistMetadata> {
        self.metadata.lock().unwrap().get(&id).cloned()
    }

    pub fn clear_metadata(&self) {
        self.metadata.lock().unwrap().clear();
    }

    pub fn next_sync_for(&self, id: DbId) -> Option<Timestamp> {
        self.next_sync.lock().unwrap().get(&id).copied()
    }

    pub fn filters_seen(&self) -> Vec<DueFilter> {
        self.filters_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncStore for FakeStore {
    async fn due_targets(
        &self,
        filter: &DueFilter,
        _now: Timestamp,
    ) -> Result<Vec<SyncTarget>, SyncError> {
        self.filters_seen.lock().unwrap().push(filter.clone());
        Ok(self
            .targets
            .iter()
            .filter(|t| {
                filter
                    .user_external_id
                    .as_deref()
                    .map_or(true, |u| t.owner_external_id == u)
            })
            .cloned()
            .collect())
    }

    async fn mark_subscription_synced(
        &self,
        subscription_id: DbId,
        _at: Timestamp,
    ) -> Result<(), SyncError> {
        self.synced_subscriptions.lock().unwrap().push(subscription_id);
        Ok(())
    }

    async fn update_metadata(
        &self,
        managed_playlist_id: DbId,
        metadata: &PlaylistMetadata,
    ) -> Result<(), SyncError> {
        self.metadata
            .lock()
            .unwrap()
            .insert(managed_playlist_id, metadata.clone());
        Ok(())
    }

    async fn mark_destination_synced(
        &self,
        managed_playlist_id: DbId,
        _synced_at: Timestamp,
        next_sync_at: Timestamp,
    ) -> Result<(), SyncError> {
        self.next_sync
            .lock()
            .unwrap()
            .insert(managed_playlist_id, next_sync_at);
        Ok(())
    }
}

/// Hands out `token-{user}` for known users and counts lookups.
#[derive(Default)]
pub struct FakeTokens {
    unlinked: HashSet<String>,
    lookups: Mutex<Vec<String>>,
}

impl FakeTokens {
    pub fn unlinked(users: &[&str]) -> Self {
        Self {
            unlinked: users.iter().map(|u| u.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccessTokenSource for FakeTokens {
    async fn access_token(&self, user_external_id: &str) -> Result<String, TokenError> {
        self.lookups.lock().unwrap().push(user_external_id.to_string());
        if self.unlinked.contains(user_external_id) {
            return Err(TokenError::NotLinked(user_external_id.to_string()));
        }
        Ok(format!("token-{user_external_id}"))
    }
}
