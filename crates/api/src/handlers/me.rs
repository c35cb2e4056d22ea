//! Handlers for the caller's own account.

use axum::extract::{Query, State};
use axum::Json;
use playlistfox_core::error::CoreError;
use playlistfox_core::pagination::{clamp_limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use playlistfox_db::models::user::User;
use playlistfox_db::repositories::UserRepo;
use playlistfox_spotify::models::{Artist, Page};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::spotify_token;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Time ranges Spotify computes affinities over.
const TIME_RANGES: &[&str] = &["short_term", "medium_term", "long_term"];

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct TopArtistsParams {
    pub limit: Option<i64>,
    pub time_range: Option<String>,
}

/// GET /api/v1/me
pub async fn get_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<User>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", auth.user_id))?;
    Ok(Json(DataResponse { data: user }))
}

/// GET /api/v1/token
///
/// The caller's Spotify access token, for the browser playback SDK.
pub async fn get_token(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<AccessToken>>> {
    let access_token = spotify_token(&state, &auth).await?;
    Ok(Json(DataResponse {
        data: AccessToken { access_token },
    }))
}

/// GET /api/v1/me/top-artists
pub async fn top_artists(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TopArtistsParams>,
) -> AppResult<Json<DataResponse<Page<Artist>>>> {
    let time_range = params.time_range.as_deref().unwrap_or("medium_term");
    if !TIME_RANGES.contains(&time_range) {
        return Err(AppError::BadRequest(format!(
            "time_range must be one of {}",
            TIME_RANGES.join(", ")
        )));
    }
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT) as u32;

    let token = spotify_token(&state, &auth).await?;
    let artists = state.spotify.top_artists(&token, limit, time_range).await?;
    Ok(Json(DataResponse { data: artists }))
}
