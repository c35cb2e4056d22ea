//! Repository for the `managed_playlist_source_subscriptions` table.
//!
//! Subscribing and unsubscribing touch the parent playlist rows as well, so
//! both run as single transactions here.

use playlistfox_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::subscription::{
    NewSubscription, SubscribeOutcome, Subscription, SubscriptionDetail, SyncSource,
    UnsubscribeOutcome,
};
use crate::repositories::{ManagedPlaylistRepo, SourcePlaylistRepo};

const COLUMNS: &str =
    "id, managed_playlist_id, source_playlist_id, last_synced_at, created_at, updated_at";

/// Join columns for [`SubscriptionDetail`]; expects aliases `s` and `sp`.
const DETAIL_COLUMNS: &str = "s.id, s.managed_playlist_id, s.source_playlist_id, \
    sp.spotify_playlist_id AS source_spotify_playlist_id, sp.name AS source_name, \
    sp.image_url AS source_image_url, s.last_synced_at, s.created_at";

pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// Subscribe a destination to each source in `input`.
    ///
    /// Reuses the caller's live managed row for the destination when there
    /// is one (its settings are left alone), otherwise creates it from
    /// `input.managed`. Sources are upserted by Spotify id. A pair that is
    /// already subscribed is returned as-is rather than duplicated.
    pub async fn subscribe(
        pool: &PgPool,
        input: &NewSubscription,
    ) -> Result<SubscribeOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let existing = ManagedPlaylistRepo::find_by_spotify_id_for_update(
            &mut *tx,
            input.managed.user_id,
            &input.managed.spotify_playlist_id,
        )
        .await?;
        let created_managed_playlist = existing.is_none();
        let managed_playlist = match existing {
            Some(row) => row,
            None => ManagedPlaylistRepo::create(&mut *tx, &input.managed).await?,
        };

        let insert = format!(
            "INSERT INTO managed_playlist_source_subscriptions (managed_playlist_id, source_playlist_id)
             VALUES ($1, $2)
             ON CONFLICT (managed_playlist_id, source_playlist_id) WHERE deleted_at IS NULL
             DO UPDATE SET updated_at = managed_playlist_source_subscriptions.updated_at
             RETURNING {COLUMNS}"
        );

        let mut sources = Vec::with_capacity(input.sources.len());
        let mut subscriptions = Vec::with_capacity(input.sources.len());
        for source_input in &input.sources {
            let source = SourcePlaylistRepo::upsert(&mut *tx, source_input).await?;
            let subscription = sqlx::query_as::<_, Subscription>(&insert)
                .bind(managed_playlist.id)
                .bind(source.id)
                .fetch_one(&mut *tx)
                .await?;
            sources.push(source);
            subscriptions.push(subscription);
        }

        tx.commit().await?;

        Ok(SubscribeOutcome {
            managed_playlist,
            created_managed_playlist,
            sources,
            subscriptions,
        })
    }

    /// One live subscription, if its destination belongs to `user_id`.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<SubscriptionDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS}
             FROM managed_playlist_source_subscriptions s
             JOIN source_playlists sp ON sp.id = s.source_playlist_id
             JOIN managed_playlists m ON m.id = s.managed_playlist_id
             WHERE s.id = $1 AND m.user_id = $2
               AND s.deleted_at IS NULL AND m.deleted_at IS NULL AND sp.deleted_at IS NULL"
        );
        sqlx::query_as::<_, SubscriptionDetail>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Live subscriptions of the given destinations, oldest first.
    pub async fn list_for_managed(
        pool: &PgPool,
        managed_playlist_ids: &[DbId],
    ) -> Result<Vec<SubscriptionDetail>, sqlx::Error> {
        if managed_playlist_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {DETAIL_COLUMNS}
             FROM managed_playlist_source_subscriptions s
             JOIN source_playlists sp ON sp.id = s.source_playlist_id
             WHERE s.managed_playlist_id = ANY($1)
               AND s.deleted_at IS NULL AND sp.deleted_at IS NULL
             ORDER BY s.created_at ASC, s.id ASC"
        );
        sqlx::query_as::<_, SubscriptionDetail>(&query)
            .bind(managed_playlist_ids)
            .fetch_all(pool)
            .await
    }

    /// Sources to pull from for each destination in a sync run.
    ///
    /// `source_spotify_playlist_id` narrows the result to one source.
    pub async fn list_sync_sources(
        pool: &PgPool,
        managed_playlist_ids: &[DbId],
        source_spotify_playlist_id: Option<&str>,
    ) -> Result<Vec<SyncSource>, sqlx::Error> {
        if managed_playlist_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, SyncSource>(
            "SELECT s.id AS subscription_id, s.managed_playlist_id,
                    sp.spotify_playlist_id AS source_spotify_playlist_id
             FROM managed_playlist_source_subscriptions s
             JOIN source_playlists sp ON sp.id = s.source_playlist_id
             WHERE s.managed_playlist_id = ANY($1)
               AND s.deleted_at IS NULL AND sp.deleted_at IS NULL
               AND ($2::TEXT IS NULL OR sp.spotify_playlist_id = $2)
             ORDER BY s.created_at ASC, s.id ASC",
        )
        .bind(managed_playlist_ids)
        .bind(source_spotify_playlist_id)
        .fetch_all(pool)
        .await
    }

    /// Record that a subscription's source was pulled.
    pub async fn mark_synced(pool: &PgPool, id: DbId, at: Timestamp) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE managed_playlist_source_subscriptions SET last_synced_at = $2
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a subscription owned by `user_id`, then soft-delete its
    /// managed and source playlists if this was their last live subscription.
    ///
    /// Both parent rows are locked before any check so a concurrent
    /// subscribe cannot attach to a parent this call is about to orphan.
    /// Returns `None` if the subscription does not exist or is not owned.
    pub async fn delete_with_orphan_cleanup(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<UnsubscribeOutcome>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let parents: Option<(DbId, DbId)> = sqlx::query_as(
            "SELECT s.managed_playlist_id, s.source_playlist_id
             FROM managed_playlist_source_subscriptions s
             JOIN managed_playlists m ON m.id = s.managed_playlist_id
             WHERE s.id = $1 AND m.user_id = $2
               AND s.deleted_at IS NULL AND m.deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((managed_id, source_id)) = parents else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("SELECT id FROM managed_playlists WHERE id = $1 FOR UPDATE")
            .bind(managed_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("SELECT id FROM source_playlists WHERE id = $1 FOR UPDATE")
            .bind(source_id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "UPDATE managed_playlist_source_subscriptions SET deleted_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        let Some(subscription) = sqlx::query_as::<_, Subscription>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            // Lost a race with another unsubscribe of the same row.
            tx.rollback().await?;
            return Ok(None);
        };

        let managed_remaining: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM managed_playlist_source_subscriptions
             WHERE managed_playlist_id = $1 AND deleted_at IS NULL",
        )
        .bind(managed_id)
        .fetch_one(&mut *tx)
        .await?;
        let managed_playlist_deleted = if managed_remaining == 0 {
            sqlx::query(
                "UPDATE managed_playlists SET deleted_at = NOW()
                 WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(managed_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
                > 0
        } else {
            false
        };

        let source_remaining: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM managed_playlist_source_subscriptions
             WHERE source_playlist_id = $1 AND deleted_at IS NULL",
        )
        .bind(source_id)
        .fetch_one(&mut *tx)
        .await?;
        let source_playlist_deleted = if source_remaining == 0 {
            sqlx::query(
                "UPDATE source_playlists SET deleted_at = NOW()
                 WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(source_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
                > 0
        } else {
            false
        };

        tx.commit().await?;

        tracing::debug!(
            subscription_id = id,
            managed_playlist_id = managed_id,
            source_playlist_id = source_id,
            managed_playlist_deleted,
            source_playlist_deleted,
            "Removed subscription",
        );

        Ok(Some(UnsubscribeOutcome {
            subscription,
            managed_playlist_deleted,
            source_playlist_deleted,
        }))
    }
}
