//! Client for the Spotify Web API.
//!
//! Wraps the playlist, browse, search, and player endpoints PlaylistFox
//! needs using [`reqwest`]. Every call takes the user's bearer token; the
//! client itself holds no credentials.

pub mod client;
pub mod error;
pub mod models;

pub use client::{SpotifyClient, ADD_TRACKS_MAX, PLAYLIST_PAGE_LIMIT};
pub use error::SpotifyError;

/// Default base URL of the Spotify Web API.
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Build the `spotify:track:{id}` URI for a track id.
pub fn track_uri(track_id: &str) -> String {
    format!("spotify:track:{track_id}")
}
