//! Response and request shapes for the Spotify Web API.
//!
//! Only the fields PlaylistFox reads are modelled; unknown fields are
//! ignored. Everything re-serializes so handlers can pass results through.

use serde::{Deserialize, Serialize};

/// An offset-paginated list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    pub display_name: Option<String>,
}

/// `{ "total": n }` reference to a playlist's tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracksRef {
    pub total: u32,
}

/// Playlist as returned by list and browse endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Spotify sends `null` here for playlists without artwork.
    #[serde(default)]
    pub images: Option<Vec<Image>>,
    pub owner: Owner,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub collaborative: bool,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub tracks: Option<TracksRef>,
}

impl SimplifiedPlaylist {
    /// URL of the first (largest) cover image, if any.
    pub fn cover_url(&self) -> Option<&str> {
        first_image(self.images.as_deref())
    }
}

/// Full playlist object from `GET /playlists/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<Image>>,
    pub owner: Owner,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    pub tracks: TracksRef,
}

impl Playlist {
    pub fn cover_url(&self) -> Option<&str> {
        first_image(self.images.as_deref())
    }
}

fn first_image(images: Option<&[Image]>) -> Option<&str> {
    images.and_then(|imgs| imgs.first()).map(|i| i.url.as_str())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedAlbum {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// A playable item inside a playlist. Episodes share this shape loosely,
/// which is why most fields default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub is_local: bool,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub album: Option<SimplifiedAlbum>,
}

impl Track {
    /// The track id when this item is a syncable Spotify track.
    ///
    /// Local files and podcast episodes have no usable track id.
    pub fn syncable_id(&self) -> Option<&str> {
        if self.is_local {
            return None;
        }
        if matches!(self.kind.as_deref(), Some(kind) if kind != "track") {
            return None;
        }
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub added_at: Option<String>,
    /// `null` for tracks removed from the catalogue.
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub popularity: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub volume_percent: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackState {
    pub device: Option<Device>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub shuffle_state: bool,
    #[serde(default)]
    pub repeat_state: Option<String>,
    /// The current track or episode, passed through untouched.
    #[serde(default)]
    pub item: Option<serde_json::Value>,
}

/// Body of `PUT /me/player/play`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_ms: Option<u64>,
}

/// Response of `POST /playlists/{id}/tracks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeaturedPlaylistsResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub playlists: Page<SimplifiedPlaylist>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryPlaylistsResponse {
    pub playlists: Page<SimplifiedPlaylist>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DevicesResponse {
    pub devices: Vec<Device>,
}

/// Curated playlists plus the editorial message Spotify attaches to them.
#[derive(Debug, Clone, Serialize)]
pub struct FeaturedPlaylists {
    pub message: Option<String>,
    pub playlists: Page<SimplifiedPlaylist>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_page_with_null_images_parses() {
        let json = r#"{
            "items": [{
                "id": "p1", "name": "Mix", "images": null,
                "owner": {"id": "u1", "display_name": "Ann"},
                "tracks": {"href": "x", "total": 12}
            }],
            "next": null, "total": 1, "limit": 20, "offset": 0
        }"#;
        let page: Page<SimplifiedPlaylist> = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].cover_url(), None);
        assert_eq!(page.items[0].tracks.as_ref().unwrap().total, 12);
    }

    #[test]
    fn syncable_id_skips_local_episode_and_missing() {
        let item_json = r#"[
            {"track": {"id": "t1", "type": "track", "is_local": false}},
            {"track": {"id": null, "type": "track", "is_local": true, "name": "file.mp3"}},
            {"track": {"id": "e1", "type": "episode"}},
            {"track": null}
        ]"#;
        let items: Vec<PlaylistItem> = serde_json::from_str(item_json).unwrap();
        let ids: Vec<&str> = items
            .iter()
            .filter_map(|i| i.track.as_ref())
            .filter_map(Track::syncable_id)
            .collect();
        assert_eq!(ids, vec!["t1"]);
    }

    #[test]
    fn play_request_omits_empty_fields() {
        let body = serde_json::to_value(PlayRequest::default()).unwrap();
        assert_eq!(body, serde_json::json!({}));
    }
}
