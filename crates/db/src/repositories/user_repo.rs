//! Repository for the `users` table.

use playlistfox_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{UpsertUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, external_id, email, display_name, avatar_url, deleted_at, created_at, updated_at";

/// Provides lookup, upsert, and soft-delete operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user or refresh the live row with the same `external_id`.
    ///
    /// Fields left `None` in `input` keep their stored value.
    pub async fn upsert(pool: &PgPool, input: &UpsertUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (external_id, email, display_name, avatar_url)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (external_id) WHERE deleted_at IS NULL DO UPDATE SET
                email = COALESCE(EXCLUDED.email, users.email),
                display_name = COALESCE(EXCLUDED.display_name, users.display_name),
                avatar_url = COALESCE(EXCLUDED.avatar_url, users.avatar_url)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.external_id)
            .bind(&input.email)
            .bind(&input.display_name)
            .bind(&input.avatar_url)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live user by identity-provider id.
    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE external_id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether `external_id` belongs only to soft-deleted rows.
    ///
    /// Tells a deleted account apart from one the database has never seen.
    pub async fn is_deleted(pool: &PgPool, external_id: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE external_id = $1 AND deleted_at IS NOT NULL)
                AND NOT EXISTS (SELECT 1 FROM users WHERE external_id = $1 AND deleted_at IS NULL)",
        )
        .bind(external_id)
        .fetch_one(pool)
        .await
    }

    /// Soft-delete a user together with everything they own.
    ///
    /// In one transaction: the user row, their managed playlists, those
    /// playlists' subscriptions, and any source playlist left without a live
    /// subscription. Returns the deleted user, or `None` if no live user
    /// had that external id.
    pub async fn soft_delete_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE users SET deleted_at = NOW()
             WHERE external_id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        let Some(user) = sqlx::query_as::<_, User>(&query)
            .bind(external_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        let affected_sources: Vec<DbId> = sqlx::query_scalar(
            "UPDATE managed_playlist_source_subscriptions s SET deleted_at = NOW()
             FROM managed_playlists m
             WHERE s.managed_playlist_id = m.id
               AND m.user_id = $1
               AND s.deleted_at IS NULL
             RETURNING s.source_playlist_id",
        )
        .bind(user.id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE managed_playlists SET deleted_at = NOW()
             WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

        let orphaned = sqlx::query(
            "UPDATE source_playlists sp SET deleted_at = NOW()
             WHERE sp.id = ANY($1)
               AND sp.deleted_at IS NULL
               AND NOT EXISTS (
                   SELECT 1 FROM managed_playlist_source_subscriptions s
                   WHERE s.source_playlist_id = sp.id AND s.deleted_at IS NULL
               )",
        )
        .bind(&affected_sources)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        tracing::debug!(
            user_id = user.id,
            subscriptions = affected_sources.len(),
            orphaned_sources = orphaned,
            "Soft-deleted user and owned playlists",
        );
        Ok(Some(user))
    }
}
