//! Batch driver: selects due destinations and runs them in paced groups.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use playlistfox_core::types::Timestamp;
use playlistfox_db::models::managed_playlist::DueFilter;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::catalog::TrackCatalog;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::reconcile::{reconcile_destination, DestinationResult, SyncStatus};
use crate::store::{SyncStore, SyncTarget};
use crate::token::AccessTokenSource;

/// Scope of a sync run. An empty request syncs every due destination.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncRequest {
    /// Run every matching destination regardless of `next_sync_at`.
    #[serde(default)]
    pub force: bool,
    /// Identity-provider id of one user.
    pub user_id: Option<String>,
    /// Spotify id of one destination playlist.
    pub playlist_id: Option<String>,
    /// Spotify id of one source playlist.
    pub source_id: Option<String>,
}

impl SyncRequest {
    fn to_filter(&self) -> DueFilter {
        DueFilter {
            force: self.force,
            user_external_id: non_empty(&self.user_id),
            spotify_playlist_id: non_empty(&self.playlist_id),
            source_spotify_playlist_id: non_empty(&self.source_id),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Aggregate outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub run_id: Uuid,
    pub started_at: Timestamp,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub tracks_added: usize,
    pub duration_ms: u64,
    pub results: Vec<DestinationResult>,
}

impl SyncSummary {
    fn from_results(
        run_id: Uuid,
        started_at: Timestamp,
        started: Instant,
        results: Vec<DestinationResult>,
    ) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        Self {
            run_id,
            started_at,
            total: results.len(),
            succeeded: count(SyncStatus::Success),
            failed: count(SyncStatus::Failed),
            skipped: count(SyncStatus::Skipped),
            tracks_added: results.iter().map(|r| r.tracks_added).sum(),
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            results,
        }
    }
}

/// Runs sync jobs. Runs are serialized: a second caller waits (or, through
/// [`SyncDriver::try_run`], gives up) until the current run finishes.
pub struct SyncDriver<C, S, T> {
    catalog: C,
    store: S,
    tokens: T,
    config: SyncConfig,
    run_lock: Mutex<()>,
}

impl<C, S, T> SyncDriver<C, S, T>
where
    C: TrackCatalog,
    S: SyncStore,
    T: AccessTokenSource,
{
    pub fn new(catalog: C, store: S, tokens: T, config: SyncConfig) -> Self {
        Self {
            catalog,
            store,
            tokens,
            config,
            run_lock: Mutex::new(()),
        }
    }

    /// Run a sync, waiting for any run already in progress.
    pub async fn run(&self, request: &SyncRequest) -> Result<SyncSummary, SyncError> {
        let _guard = self.run_lock.lock().await;
        self.run_locked(request).await
    }

    /// Run a sync unless one is already in progress, in which case `None`.
    pub async fn try_run(&self, request: &SyncRequest) -> Option<Result<SyncSummary, SyncError>> {
        let _guard = self.run_lock.try_lock().ok()?;
        Some(self.run_locked(request).await)
    }

    async fn run_locked(&self, request: &SyncRequest) -> Result<SyncSummary, SyncError> {
        let run_id = Uuid::now_v7();
        let started = Instant::now();
        let started_at = Utc::now();

        let targets = self.store.due_targets(&request.to_filter(), started_at).await?;
        tracing::info!(
            %run_id,
            destinations = targets.len(),
            force = request.force,
            "Sync run started"
        );

        let tokens = self.fetch_tokens(&targets).await;

        let group_size = self.config.group_size.max(1);
        let mut results = Vec::with_capacity(targets.len());
        for (index, group) in targets.chunks(group_size).enumerate() {
            if index > 0 && !self.config.group_pause.is_zero() {
                tokio::time::sleep(self.config.group_pause).await;
            }
            let runs = group.iter().map(|target| self.run_target(target, &tokens));
            results.extend(join_all(runs).await);
        }

        let summary = SyncSummary::from_results(run_id, started_at, started, results);
        tracing::info!(
            %run_id,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            added = summary.tracks_added,
            elapsed_ms = summary.duration_ms,
            "Sync run finished"
        );
        Ok(summary)
    }

    /// One token lookup per distinct owner.
    async fn fetch_tokens(&self, targets: &[SyncTarget]) -> HashMap<String, Result<String, String>> {
        let mut tokens = HashMap::new();
        for target in targets {
            if tokens.contains_key(&target.owner_external_id) {
                continue;
            }
            let token = self
                .tokens
                .access_token(&target.owner_external_id)
                .await
                .map_err(|e| {
                    tracing::warn!(
                        user_id = %target.owner_external_id,
                        error = %e,
                        "No Spotify token for user, their playlists will fail"
                    );
                    e.to_string()
                });
            tokens.insert(target.owner_external_id.clone(), token);
        }
        tokens
    }

    async fn run_target(
        &self,
        target: &SyncTarget,
        tokens: &HashMap<String, Result<String, String>>,
    ) -> DestinationResult {
        match tokens.get(&target.owner_external_id) {
            Some(Ok(token)) => {
                reconcile_destination(&self.catalog, &self.store, &self.config, target, token).await
            }
            Some(Err(e)) => DestinationResult::failed_without_work(target, e.clone()),
            None => DestinationResult::failed_without_work(
                target,
                "No access token was requested for this user".to_string(),
            ),
        }
    }
}
