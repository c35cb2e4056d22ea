//! HTTP client for the Spotify Web API endpoints PlaylistFox calls.

use reqwest::header::RETRY_AFTER;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;

use crate::error::SpotifyError;
use crate::models::{
    Artist, CategoryPlaylistsResponse, Device, DevicesResponse, FeaturedPlaylists,
    FeaturedPlaylistsResponse, Page, PlayRequest, PlaybackState, Playlist, PlaylistItem,
    SimplifiedPlaylist, SnapshotResponse,
};

/// Largest page the playlist-items endpoint returns.
pub const PLAYLIST_PAGE_LIMIT: u32 = 100;

/// Most track URIs accepted by one add-tracks request.
pub const ADD_TRACKS_MAX: usize = 100;

/// Field filter applied when only track ids are needed.
const TRACK_ID_FIELDS: &str = "items(track(id,uri,type,is_local)),next";

/// Client for the Spotify Web API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct TrackIdPage {
    items: Vec<PlaylistItem>,
    next: Option<String>,
}

impl SpotifyClient {
    /// * `api_url` - Base URL, e.g. `https://api.spotify.com/v1`.
    pub fn new(api_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- playlists ----

    /// Every syncable track id in a playlist, in listing order.
    ///
    /// Pages through `GET /playlists/{id}/tracks` at the maximum page size
    /// and follows `next` until it is null. Local files, episodes, and
    /// removed tracks are skipped.
    pub async fn playlist_track_ids(
        &self,
        token: &str,
        playlist_id: &str,
    ) -> Result<Vec<String>, SpotifyError> {
        let first = format!(
            "{}/playlists/{}/tracks?fields={}&limit={}",
            self.api_url,
            playlist_id,
            TRACK_ID_FIELDS,
            PLAYLIST_PAGE_LIMIT
        );

        let mut ids = Vec::new();
        let mut next = Some(first);
        let mut pages = 0usize;
        while let Some(url) = next {
            let page: TrackIdPage =
                Self::parse_response(self.client.get(&url).bearer_auth(token)).await?;
            ids.extend(
                page.items
                    .iter()
                    .filter_map(|item| item.track.as_ref())
                    .filter_map(|track| track.syncable_id())
                    .map(str::to_string),
            );
            pages += 1;
            next = page.next;
        }

        tracing::debug!(playlist_id, pages, tracks = ids.len(), "Listed playlist track ids");
        Ok(ids)
    }

    /// Append tracks to a playlist in one request.
    ///
    /// Callers batch; more than [`ADD_TRACKS_MAX`] ids is rejected before
    /// any request is sent.
    pub async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<SnapshotResponse, SpotifyError> {
        if track_ids.len() > ADD_TRACKS_MAX {
            return Err(SpotifyError::TooManyItems {
                count: track_ids.len(),
                max: ADD_TRACKS_MAX,
            });
        }
        let uris: Vec<String> = track_ids.iter().map(|id| crate::track_uri(id)).collect();
        let body = serde_json::json!({ "uris": uris });

        let request = self
            .client
            .post(format!("{}/playlists/{}/tracks", self.api_url, playlist_id))
            .bearer_auth(token)
            .json(&body);

        Self::parse_response(request).await
    }

    /// Playlist detail: name, images, owner, total track count.
    pub async fn playlist(&self, token: &str, playlist_id: &str) -> Result<Playlist, SpotifyError> {
        let request = self
            .client
            .get(format!("{}/playlists/{}", self.api_url, playlist_id))
            .bearer_auth(token);
        Self::parse_response(request).await
    }

    /// One page of full playlist items.
    pub async fn playlist_tracks_page(
        &self,
        token: &str,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>, SpotifyError> {
        let request = self
            .client
            .get(format!("{}/playlists/{}/tracks", self.api_url, playlist_id))
            .bearer_auth(token)
            .query(&[("limit", limit), ("offset", offset)]);
        Self::parse_response(request).await
    }

    /// The current user's playlists.
    pub async fn my_playlists(
        &self,
        token: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<SimplifiedPlaylist>, SpotifyError> {
        let request = self
            .client
            .get(format!("{}/me/playlists", self.api_url))
            .bearer_auth(token)
            .query(&[("limit", limit), ("offset", offset)]);
        Self::parse_response(request).await
    }

    pub async fn featured_playlists(
        &self,
        token: &str,
        limit: u32,
        offset: u32,
    ) -> Result<FeaturedPlaylists, SpotifyError> {
        let request = self
            .client
            .get(format!("{}/browse/featured-playlists", self.api_url))
            .bearer_auth(token)
            .query(&[("limit", limit), ("offset", offset)]);
        let response: FeaturedPlaylistsResponse = Self::parse_response(request).await?;
        Ok(FeaturedPlaylists {
            message: response.message,
            playlists: response.playlists,
        })
    }

    pub async fn category_playlists(
        &self,
        token: &str,
        category_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<SimplifiedPlaylist>, SpotifyError> {
        let request = self
            .client
            .get(format!(
                "{}/browse/categories/{}/playlists",
                self.api_url, category_id
            ))
            .bearer_auth(token)
            .query(&[("limit", limit), ("offset", offset)]);
        let response: CategoryPlaylistsResponse = Self::parse_response(request).await?;
        Ok(response.playlists)
    }

    // ---- search & personalization ----

    /// Raw search results keyed by result type (`playlists`, `tracks`, ...).
    ///
    /// * `types` - Comma-separated list, e.g. `playlist,track`.
    pub async fn search(
        &self,
        token: &str,
        query: &str,
        types: &str,
        limit: u32,
        offset: u32,
    ) -> Result<serde_json::Value, SpotifyError> {
        let request = self
            .client
            .get(format!("{}/search", self.api_url))
            .bearer_auth(token)
            .query(&[("q", query), ("type", types)])
            .query(&[("limit", limit), ("offset", offset)]);
        Self::parse_response(request).await
    }

    /// * `time_range` - `short_term`, `medium_term`, or `long_term`.
    pub async fn top_artists(
        &self,
        token: &str,
        limit: u32,
        time_range: &str,
    ) -> Result<Page<Artist>, SpotifyError> {
        let request = self
            .client
            .get(format!("{}/me/top/artists", self.api_url))
            .bearer_auth(token)
            .query(&[("limit", limit.to_string().as_str()), ("time_range", time_range)]);
        Self::parse_response(request).await
    }

    // ---- player ----

    /// Current playback state, or `None` when nothing is playing.
    pub async fn playback_state(&self, token: &str) -> Result<Option<PlaybackState>, SpotifyError> {
        let request = self
            .client
            .get(format!("{}/me/player", self.api_url))
            .bearer_auth(token);
        let response = Self::ensure_success(request.send().await?).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(response.json::<PlaybackState>().await?))
    }

    pub async fn devices(&self, token: &str) -> Result<Vec<Device>, SpotifyError> {
        let request = self
            .client
            .get(format!("{}/me/player/devices", self.api_url))
            .bearer_auth(token);
        let response: DevicesResponse = Self::parse_response(request).await?;
        Ok(response.devices)
    }

    /// Start or resume playback, optionally on a specific device.
    pub async fn play(
        &self,
        token: &str,
        device_id: Option<&str>,
        body: &PlayRequest,
    ) -> Result<(), SpotifyError> {
        let mut request = self
            .client
            .put(format!("{}/me/player/play", self.api_url))
            .bearer_auth(token)
            .json(body);
        if let Some(device_id) = device_id {
            request = request.query(&[("device_id", device_id)]);
        }
        Self::check_status(request).await
    }

    pub async fn pause(&self, token: &str, device_id: Option<&str>) -> Result<(), SpotifyError> {
        self.player_command(
            self.client.put(format!("{}/me/player/pause", self.api_url)),
            token,
            device_id,
        )
        .await
    }

    pub async fn next(&self, token: &str, device_id: Option<&str>) -> Result<(), SpotifyError> {
        self.player_command(
            self.client.post(format!("{}/me/player/next", self.api_url)),
            token,
            device_id,
        )
        .await
    }

    pub async fn previous(&self, token: &str, device_id: Option<&str>) -> Result<(), SpotifyError> {
        self.player_command(
            self.client.post(format!("{}/me/player/previous", self.api_url)),
            token,
            device_id,
        )
        .await
    }

    /// Move playback to another device.
    pub async fn transfer(&self, token: &str, device_id: &str, play: bool) -> Result<(), SpotifyError> {
        let body = serde_json::json!({ "device_ids": [device_id], "play": play });
        let request = self
            .client
            .put(format!("{}/me/player", self.api_url))
            .bearer_auth(token)
            .json(&body);
        Self::check_status(request).await
    }

    // ---- private helpers ----

    /// Bodiless player command. Spotify rejects these without a
    /// `Content-Length`, so an empty body is always sent.
    async fn player_command(
        &self,
        request: RequestBuilder,
        token: &str,
        device_id: Option<&str>,
    ) -> Result<(), SpotifyError> {
        let mut request = request.bearer_auth(token).body(Vec::new());
        if let Some(device_id) = device_id {
            request = request.query(&[("device_id", device_id)]);
        }
        Self::check_status(request).await
    }

    /// Ensure the response has a success status code, mapping failures
    /// through [`SpotifyError::from_status`].
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SpotifyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(?retry_after, "Spotify rate limit hit");
        }
        Err(SpotifyError::from_status(status, retry_after, &body))
    }

    /// Send the request and parse a successful JSON body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<T, SpotifyError> {
        let response = Self::ensure_success(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    /// Send the request and discard the body.
    async fn check_status(request: RequestBuilder) -> Result<(), SpotifyError> {
        Self::ensure_success(request.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = SpotifyClient::new("https://api.spotify.com/v1/".to_string());
        assert_eq!(client.api_url(), "https://api.spotify.com/v1");
    }

    #[test]
    fn track_id_page_parses_with_field_filter_shape() {
        let json = r#"{
            "items": [
                {"track": {"id": "a", "uri": "spotify:track:a", "type": "track"}},
                {"track": {"id": null, "uri": "spotify:local:x", "type": "track", "is_local": true}},
                {"track": null}
            ],
            "next": "https://api.spotify.com/v1/playlists/p/tracks?offset=100"
        }"#;
        let page: TrackIdPage = serde_json::from_str(json).unwrap();
        let ids: Vec<&str> = page
            .items
            .iter()
            .filter_map(|i| i.track.as_ref())
            .filter_map(|t| t.syncable_id())
            .collect();
        assert_eq!(ids, vec!["a"]);
        assert!(page.next.is_some());
    }

    #[tokio::test]
    async fn oversized_add_is_rejected_without_request() {
        // Unroutable URL: the call must fail before any I/O.
        let client = SpotifyClient::new("http://127.0.0.1:1".to_string());
        let ids: Vec<String> = (0..=ADD_TRACKS_MAX).map(|i| format!("t{i}")).collect();
        let err = client.add_tracks("tok", "p", &ids).await.unwrap_err();
        assert_matches!(err, SpotifyError::TooManyItems { count: 101, max: 100 });
    }
}
