/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A Spotify object id (playlist, track, artist), e.g. `37i9dQZF1DXcBWIGoYBM5M`.
pub type SpotifyId = String;
