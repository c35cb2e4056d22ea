//! Playback control for the caller's active Spotify device.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use playlistfox_spotify::models::{Device, PlayRequest, PlaybackState};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::spotify_token;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Optional `?device_id=` target; Spotify uses the active device otherwise.
#[derive(Debug, Deserialize)]
pub struct DeviceParams {
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub device_id: String,
    #[serde(default)]
    pub play: bool,
}

/// GET /api/v1/player
///
/// `data` is null when nothing is playing.
pub async fn playback_state(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Option<PlaybackState>>>> {
    let token = spotify_token(&state, &auth).await?;
    let playback = state.spotify.playback_state(&token).await?;
    Ok(Json(DataResponse { data: playback }))
}

/// GET /api/v1/player/devices
pub async fn devices(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Device>>>> {
    let token = spotify_token(&state, &auth).await?;
    let devices = state.spotify.devices(&token).await?;
    Ok(Json(DataResponse { data: devices }))
}

/// PUT /api/v1/player/play
///
/// An empty body `{}` resumes playback.
pub async fn play(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DeviceParams>,
    Json(body): Json<PlayRequest>,
) -> AppResult<StatusCode> {
    let token = spotify_token(&state, &auth).await?;
    state
        .spotify
        .play(&token, params.device_id.as_deref(), &body)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/player/pause
pub async fn pause(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DeviceParams>,
) -> AppResult<StatusCode> {
    let token = spotify_token(&state, &auth).await?;
    state.spotify.pause(&token, params.device_id.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/player/next
pub async fn next(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DeviceParams>,
) -> AppResult<StatusCode> {
    let token = spotify_token(&state, &auth).await?;
    state.spotify.next(&token, params.device_id.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/player/previous
pub async fn previous(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DeviceParams>,
) -> AppResult<StatusCode> {
    let token = spotify_token(&state, &auth).await?;
    state
        .spotify
        .previous(&token, params.device_id.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/player/transfer
pub async fn transfer(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<TransferRequest>,
) -> AppResult<StatusCode> {
    let device_id = body.device_id.trim();
    if device_id.is_empty() {
        return Err(AppError::BadRequest("device_id must not be empty".into()));
    }
    let token = spotify_token(&state, &auth).await?;
    state.spotify.transfer(&token, device_id, body.play).await?;
    Ok(StatusCode::NO_CONTENT)
}
