//! Read-only playlist browsing, proxied to Spotify.

use axum::extract::{Path, Query, State};
use axum::Json;
use playlistfox_spotify::models::{FeaturedPlaylists, Page, Playlist, PlaylistItem, SimplifiedPlaylist};

use crate::error::AppResult;
use crate::handlers::spotify_token;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/playlists/mine
pub async fn my_playlists(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Page<SimplifiedPlaylist>>>> {
    let token = spotify_token(&state, &auth).await?;
    let page = state
        .spotify
        .my_playlists(&token, params.limit(), params.offset())
        .await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/playlists/featured
pub async fn featured_playlists(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<FeaturedPlaylists>>> {
    let token = spotify_token(&state, &auth).await?;
    let featured = state
        .spotify
        .featured_playlists(&token, params.limit(), params.offset())
        .await?;
    Ok(Json(DataResponse { data: featured }))
}

/// GET /api/v1/playlists/categories/{category_id}
pub async fn category_playlists(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Page<SimplifiedPlaylist>>>> {
    let token = spotify_token(&state, &auth).await?;
    let page = state
        .spotify
        .category_playlists(&token, &category_id, params.limit(), params.offset())
        .await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/playlists/{spotify_id}
pub async fn get_playlist(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(spotify_id): Path<String>,
) -> AppResult<Json<DataResponse<Playlist>>> {
    let token = spotify_token(&state, &auth).await?;
    let playlist = state.spotify.playlist(&token, &spotify_id).await?;
    Ok(Json(DataResponse { data: playlist }))
}

/// GET /api/v1/playlists/{spotify_id}/tracks
pub async fn playlist_tracks(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(spotify_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Page<PlaylistItem>>>> {
    let token = spotify_token(&state, &auth).await?;
    let page = state
        .spotify
        .playlist_tracks_page(&token, &spotify_id, params.limit(), params.offset())
        .await?;
    Ok(Json(DataResponse { data: page }))
}
