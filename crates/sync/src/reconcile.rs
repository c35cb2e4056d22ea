//! Reconciliation of one destination against its sources.

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use playlistfox_core::scheduling::next_sync_at;
use playlistfox_core::selection::select_new_tracks;
use playlistfox_core::types::DbId;
use playlistfox_spotify::ADD_TRACKS_MAX;
use serde::Serialize;

use crate::catalog::TrackCatalog;
use crate::config::SyncConfig;
use crate::store::{SourceRef, SyncStore, SyncTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Success,
    Failed,
    Skipped,
}

/// Outcome for one subscription within a destination run.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResult {
    pub subscription_id: DbId,
    pub source_playlist_id: String,
    pub status: SyncStatus,
    pub tracks_added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome for one destination.
#[derive(Debug, Clone, Serialize)]
pub struct DestinationResult {
    pub managed_playlist_id: DbId,
    pub spotify_playlist_id: String,
    pub status: SyncStatus,
    pub tracks_added: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub subscriptions: Vec<SubscriptionResult>,
}

impl DestinationResult {
    /// A destination failed before any upstream work, e.g. no access token.
    pub fn failed_without_work(target: &SyncTarget, error: String) -> Self {
        Self {
            managed_playlist_id: target.managed_playlist_id,
            spotify_playlist_id: target.spotify_playlist_id.clone(),
            status: SyncStatus::Failed,
            tracks_added: 0,
            elapsed_ms: 0,
            error: Some(error),
            subscriptions: Vec::new(),
        }
    }
}

/// Pull up to `quantity_per_source` new tracks from every source of
/// `target` into its destination playlist.
///
/// Subscriptions run one after another against a shared view of the
/// destination's contents, so a track offered by two sources is added once.
/// A failing subscription is recorded and the rest still run. Never returns
/// an error: every failure ends up in the result.
pub async fn reconcile_destination<C, S>(
    catalog: &C,
    store: &S,
    config: &SyncConfig,
    target: &SyncTarget,
    token: &str,
) -> DestinationResult
where
    C: TrackCatalog + ?Sized,
    S: SyncStore + ?Sized,
{
    let started = Instant::now();
    let mut result = DestinationResult {
        managed_playlist_id: target.managed_playlist_id,
        spotify_playlist_id: target.spotify_playlist_id.clone(),
        status: SyncStatus::Skipped,
        tracks_added: 0,
        elapsed_ms: 0,
        error: None,
        subscriptions: Vec::with_capacity(target.sources.len()),
    };

    if target.sources.is_empty() {
        tracing::info!(
            managed_playlist_id = target.managed_playlist_id,
            "No live subscriptions, skipping"
        );
        finish_schedule(store, target, &mut result).await;
        result.elapsed_ms = elapsed_ms(started);
        return result;
    }

    let mut existing: HashSet<String> = match catalog
        .playlist_track_ids(token, &target.spotify_playlist_id)
        .await
    {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => {
            tracing::warn!(
                managed_playlist_id = target.managed_playlist_id,
                playlist_id = %target.spotify_playlist_id,
                error = %e,
                "Failed to list destination tracks"
            );
            result.status = SyncStatus::Failed;
            result.error = Some(format!("Failed to list destination tracks: {e}"));
            result.elapsed_ms = elapsed_ms(started);
            return result;
        }
    };

    for source in &target.sources {
        let outcome =
            sync_subscription(catalog, store, config, target, source, token, &mut existing).await;
        result.tracks_added += outcome.tracks_added;
        result.subscriptions.push(outcome);
    }

    result.status = rollup_status(&result.subscriptions);
    let failures = result
        .subscriptions
        .iter()
        .filter(|s| s.status == SyncStatus::Failed)
        .count();
    if failures > 0 {
        result.error = Some(format!(
            "{failures} of {} subscriptions failed",
            result.subscriptions.len()
        ));
    }

    if result.tracks_added > 0 {
        refresh_metadata(catalog, store, target, token).await;
    }

    finish_schedule(store, target, &mut result).await;
    result.elapsed_ms = elapsed_ms(started);

    tracing::info!(
        managed_playlist_id = target.managed_playlist_id,
        status = ?result.status,
        added = result.tracks_added,
        elapsed_ms = result.elapsed_ms,
        "Destination synced"
    );
    result
}

/// Pull new tracks from one source. Updates `existing` with what was added.
async fn sync_subscription<C, S>(
    catalog: &C,
    store: &S,
    config: &SyncConfig,
    target: &SyncTarget,
    source: &SourceRef,
    token: &str,
    existing: &mut HashSet<String>,
) -> SubscriptionResult
where
    C: TrackCatalog + ?Sized,
    S: SyncStore + ?Sized,
{
    let mut outcome = SubscriptionResult {
        subscription_id: source.subscription_id,
        source_playlist_id: source.spotify_playlist_id.clone(),
        status: SyncStatus::Success,
        tracks_added: 0,
        error: None,
    };

    let source_ids = match catalog
        .playlist_track_ids(token, &source.spotify_playlist_id)
        .await
    {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(
                subscription_id = source.subscription_id,
                source_playlist_id = %source.spotify_playlist_id,
                error = %e,
                "Failed to list source tracks"
            );
            outcome.status = SyncStatus::Failed;
            outcome.error = Some(e.to_string());
            return outcome;
        }
    };

    if source_ids.is_empty() {
        tracing::info!(
            subscription_id = source.subscription_id,
            source_playlist_id = %source.spotify_playlist_id,
            "Source playlist is empty, skipping"
        );
        outcome.status = SyncStatus::Skipped;
        return outcome;
    }

    let picked = select_new_tracks(&source_ids, &*existing, target.quantity_per_source);

    for (index, batch) in picked.chunks(ADD_TRACKS_MAX).enumerate() {
        if index > 0 && !config.batch_delay.is_zero() {
            tokio::time::sleep(config.batch_delay).await;
        }
        if let Err(e) = catalog
            .add_tracks(token, &target.spotify_playlist_id, batch)
            .await
        {
            tracing::warn!(
                subscription_id = source.subscription_id,
                added = outcome.tracks_added,
                error = %e,
                "Failed to add tracks"
            );
            outcome.status = SyncStatus::Failed;
            outcome.error = Some(e.to_string());
            return outcome;
        }
        existing.extend(batch.iter().cloned());
        outcome.tracks_added += batch.len();
    }

    if let Err(e) = store
        .mark_subscription_synced(source.subscription_id, Utc::now())
        .await
    {
        tracing::warn!(
            subscription_id = source.subscription_id,
            error = %e,
            "Failed to record subscription sync time"
        );
    }

    tracing::debug!(
        subscription_id = source.subscription_id,
        source_playlist_id = %source.spotify_playlist_id,
        added = outcome.tracks_added,
        "Subscription synced"
    );
    outcome
}

/// Any success makes the destination a success; otherwise any failure
/// makes it a failure; otherwise everything was skipped.
fn rollup_status(subscriptions: &[SubscriptionResult]) -> SyncStatus {
    if subscriptions.iter().any(|s| s.status == SyncStatus::Success) {
        SyncStatus::Success
    } else if subscriptions.iter().any(|s| s.status == SyncStatus::Failed) {
        SyncStatus::Failed
    } else {
        SyncStatus::Skipped
    }
}

async fn refresh_metadata<C, S>(catalog: &C, store: &S, target: &SyncTarget, token: &str)
where
    C: TrackCatalog + ?Sized,
    S: SyncStore + ?Sized,
{
    let metadata = match catalog
        .playlist_metadata(token, &target.spotify_playlist_id)
        .await
    {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(
                managed_playlist_id = target.managed_playlist_id,
                error = %e,
                "Failed to fetch destination metadata"
            );
            return;
        }
    };
    if let Err(e) = store
        .update_metadata(target.managed_playlist_id, &metadata)
        .await
    {
        tracing::warn!(
            managed_playlist_id = target.managed_playlist_id,
            error = %e,
            "Failed to store destination metadata"
        );
    }
}

/// Persist `last_synced_at` and the next due time.
async fn finish_schedule<S>(store: &S, target: &SyncTarget, result: &mut DestinationResult)
where
    S: SyncStore + ?Sized,
{
    let now = Utc::now();
    let next = match next_sync_at(target.interval, target.schedule.as_ref(), now) {
        Ok(next) => next,
        Err(e) => {
            tracing::error!(
                managed_playlist_id = target.managed_playlist_id,
                error = %e,
                "Cannot compute next sync time"
            );
            result.status = SyncStatus::Failed;
            result.error = Some(e.to_string());
            return;
        }
    };
    if let Err(e) = store
        .mark_destination_synced(target.managed_playlist_id, now, next)
        .await
    {
        tracing::error!(
            managed_playlist_id = target.managed_playlist_id,
            error = %e,
            "Failed to record destination sync time"
        );
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
