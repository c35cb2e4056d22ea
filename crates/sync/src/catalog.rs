use async_trait::async_trait;
use playlistfox_db::models::managed_playlist::PlaylistMetadata;
use playlistfox_spotify::{SpotifyClient, SpotifyError};

/// The upstream calls a sync run makes.
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Every track id in a playlist, in listing order.
    async fn playlist_track_ids(&self, token: &str, playlist_id: &str)
        -> Result<Vec<String>, SpotifyError>;

    /// Append one batch of tracks (at most [`playlistfox_spotify::ADD_TRACKS_MAX`]).
    async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyError>;

    /// Current name, cover, and track count.
    async fn playlist_metadata(
        &self,
        token: &str,
        playlist_id: &str,
    ) -> Result<PlaylistMetadata, SpotifyError>;
}

#[async_trait]
impl TrackCatalog for SpotifyClient {
    async fn playlist_track_ids(
        &self,
        token: &str,
        playlist_id: &str,
    ) -> Result<Vec<String>, SpotifyError> {
        SpotifyClient::playlist_track_ids(self, token, playlist_id).await
    }

    async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyError> {
        SpotifyClient::add_tracks(self, token, playlist_id, track_ids).await?;
        Ok(())
    }

    async fn playlist_metadata(
        &self,
        token: &str,
        playlist_id: &str,
    ) -> Result<PlaylistMetadata, SpotifyError> {
        let playlist = self.playlist(token, playlist_id).await?;
        Ok(PlaylistMetadata {
            image_url: playlist.cover_url().map(str::to_string),
            track_count: i32::try_from(playlist.tracks.total).unwrap_or(i32::MAX),
            name: playlist.name,
        })
    }
}
