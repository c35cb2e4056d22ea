//! Repository for the `managed_playlists` table.

use playlistfox_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::managed_playlist::{
    CreateManagedPlaylist, DueFilter, DueManagedPlaylist, ManagedPlaylist, PlaylistMetadata,
    SyncSettings,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, spotify_playlist_id, name, image_url, track_count, \
    sync_interval, sync_quantity_per_source, sync_mode, custom_days, custom_time, \
    content_filters, last_synced_at, next_sync_at, created_at, updated_at";

/// Provides CRUD and sync-bookkeeping operations for managed playlists.
pub struct ManagedPlaylistRepo;

impl ManagedPlaylistRepo {
    /// Insert a managed playlist. Runs on the caller's connection so it can
    /// share the subscribe transaction.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateManagedPlaylist,
    ) -> Result<ManagedPlaylist, sqlx::Error> {
        let query = format!(
            "INSERT INTO managed_playlists
                (user_id, spotify_playlist_id, name, image_url, track_count,
                 sync_interval, sync_quantity_per_source, sync_mode,
                 custom_days, custom_time, content_filters, next_sync_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        let s = &input.settings;
        sqlx::query_as::<_, ManagedPlaylist>(&query)
            .bind(input.user_id)
            .bind(&input.spotify_playlist_id)
            .bind(&input.name)
            .bind(&input.image_url)
            .bind(input.track_count)
            .bind(&s.sync_interval)
            .bind(s.sync_quantity_per_source)
            .bind(&s.sync_mode)
            .bind(&s.custom_days)
            .bind(&s.custom_time)
            .bind(&s.content_filters)
            .bind(s.next_sync_at)
            .fetch_one(conn)
            .await
    }

    /// Find a live managed playlist by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ManagedPlaylist>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM managed_playlists WHERE id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, ManagedPlaylist>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live managed playlist owned by `user_id`.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<ManagedPlaylist>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM managed_playlists
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, ManagedPlaylist>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Lock and return the caller's live row for a Spotify playlist, if any.
    pub async fn find_by_spotify_id_for_update(
        conn: &mut PgConnection,
        user_id: DbId,
        spotify_playlist_id: &str,
    ) -> Result<Option<ManagedPlaylist>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM managed_playlists
             WHERE user_id = $1 AND spotify_playlist_id = $2 AND deleted_at IS NULL
             FOR UPDATE"
        );
        sqlx::query_as::<_, ManagedPlaylist>(&query)
            .bind(user_id)
            .bind(spotify_playlist_id)
            .fetch_optional(conn)
            .await
    }

    /// List a user's live managed playlists, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ManagedPlaylist>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM managed_playlists
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, ManagedPlaylist>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Replace the sync settings of a playlist owned by `user_id`.
    ///
    /// Returns `None` if no such live row exists.
    pub async fn update_settings(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        settings: &SyncSettings,
    ) -> Result<Option<ManagedPlaylist>, sqlx::Error> {
        let query = format!(
            "UPDATE managed_playlists SET
                sync_interval = $3,
                sync_quantity_per_source = $4,
                sync_mode = $5,
                custom_days = $6,
                custom_time = $7,
                content_filters = $8,
                next_sync_at = $9
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ManagedPlaylist>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&settings.sync_interval)
            .bind(settings.sync_quantity_per_source)
            .bind(&settings.sync_mode)
            .bind(&settings.custom_days)
            .bind(&settings.custom_time)
            .bind(&settings.content_filters)
            .bind(settings.next_sync_at)
            .fetch_optional(pool)
            .await
    }

    /// Select destinations for a sync run.
    ///
    /// Without `force`, only rows whose `next_sync_at` is unset or at/before
    /// `now` qualify. Rows of soft-deleted users never qualify.
    pub async fn list_due(
        pool: &PgPool,
        filter: &DueFilter,
        now: Timestamp,
    ) -> Result<Vec<DueManagedPlaylist>, sqlx::Error> {
        sqlx::query_as::<_, DueManagedPlaylist>(
            "SELECT m.id, m.user_id, u.external_id AS owner_external_id,
                    m.spotify_playlist_id, m.sync_interval, m.sync_quantity_per_source,
                    m.custom_days, m.custom_time
             FROM managed_playlists m
             JOIN users u ON u.id = m.user_id AND u.deleted_at IS NULL
             WHERE m.deleted_at IS NULL
               AND ($1 OR m.next_sync_at IS NULL OR m.next_sync_at <= $2)
               AND ($3::TEXT IS NULL OR u.external_id = $3)
               AND ($4::TEXT IS NULL OR m.spotify_playlist_id = $4)
               AND ($5::TEXT IS NULL OR EXISTS (
                   SELECT 1
                   FROM managed_playlist_source_subscriptions s
                   JOIN source_playlists sp ON sp.id = s.source_playlist_id
                   WHERE s.managed_playlist_id = m.id
                     AND s.deleted_at IS NULL
                     AND sp.deleted_at IS NULL
                     AND sp.spotify_playlist_id = $5
               ))
             ORDER BY m.next_sync_at ASC NULLS FIRST, m.id ASC",
        )
        .bind(filter.force)
        .bind(now)
        .bind(&filter.user_external_id)
        .bind(&filter.spotify_playlist_id)
        .bind(&filter.source_spotify_playlist_id)
        .fetch_all(pool)
        .await
    }

    /// Overwrite cached display metadata. Returns `true` if a row changed.
    pub async fn update_metadata(
        pool: &PgPool,
        id: DbId,
        metadata: &PlaylistMetadata,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE managed_playlists SET name = $2, image_url = $3, track_count = $4
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(&metadata.name)
        .bind(&metadata.image_url)
        .bind(metadata.track_count)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a completed sync and the next due time.
    pub async fn mark_synced(
        pool: &PgPool,
        id: DbId,
        synced_at: Timestamp,
        next_sync_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE managed_playlists SET last_synced_at = $2, next_sync_at = $3
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(synced_at)
        .bind(next_sync_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
