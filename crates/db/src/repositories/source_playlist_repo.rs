//! Repository for the `source_playlists` table.

use sqlx::{PgConnection, PgPool};

use crate::models::source_playlist::{SourcePlaylist, UpsertSourcePlaylist};

const COLUMNS: &str = "id, spotify_playlist_id, name, image_url, created_at, updated_at";

pub struct SourcePlaylistRepo;

impl SourcePlaylistRepo {
    /// Find a live source playlist by Spotify id.
    pub async fn find_by_spotify_id(
        pool: &PgPool,
        spotify_playlist_id: &str,
    ) -> Result<Option<SourcePlaylist>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM source_playlists
             WHERE spotify_playlist_id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, SourcePlaylist>(&query)
            .bind(spotify_playlist_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a source or refresh the live row with the same Spotify id.
    ///
    /// Takes a connection so callers can run it inside their transaction;
    /// the upsert leaves the row locked until that transaction ends.
    pub async fn upsert(
        conn: &mut PgConnection,
        input: &UpsertSourcePlaylist,
    ) -> Result<SourcePlaylist, sqlx::Error> {
        let query = format!(
            "INSERT INTO source_playlists (spotify_playlist_id, name, image_url)
             VALUES ($1, $2, $3)
             ON CONFLICT (spotify_playlist_id) WHERE deleted_at IS NULL DO UPDATE SET
                name = EXCLUDED.name,
                image_url = COALESCE(EXCLUDED.image_url, source_playlists.image_url)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SourcePlaylist>(&query)
            .bind(&input.spotify_playlist_id)
            .bind(&input.name)
            .bind(&input.image_url)
            .fetch_one(conn)
            .await
    }
}
