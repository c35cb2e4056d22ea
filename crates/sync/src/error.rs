use playlistfox_core::error::CoreError;
use playlistfox_spotify::SpotifyError;

/// Failures that abort a sync step.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Spotify(#[from] SpotifyError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}
