use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::spotify_token;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Object types the search endpoint forwards.
const SEARCH_TYPES: &[&str] = &["playlist", "track", "artist", "album"];

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/search
///
/// `type` is a comma-separated subset of playlist, track, artist, album and
/// defaults to playlist.
pub async fn search(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("q must not be empty".into()));
    }
    let types = normalize_types(params.kind.as_deref().unwrap_or("playlist"))?;
    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };

    let token = spotify_token(&state, &auth).await?;
    let results = state
        .spotify
        .search(&token, query, &types, page.limit(), page.offset())
        .await?;
    Ok(Json(DataResponse { data: results }))
}

fn normalize_types(raw: &str) -> Result<String, AppError> {
    let mut types: Vec<&str> = Vec::new();
    for kind in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !SEARCH_TYPES.contains(&kind) {
            return Err(AppError::BadRequest(format!("Unsupported search type '{kind}'")));
        }
        if !types.contains(&kind) {
            types.push(kind);
        }
    }
    if types.is_empty() {
        return Err(AppError::BadRequest("type must not be empty".into()));
    }
    Ok(types.join(","))
}
