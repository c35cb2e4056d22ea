//! Handlers for the caller's audit trail, plus the shared audit writer.

use axum::extract::{Query, State};
use axum::Json;
use playlistfox_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use playlistfox_db::models::audit::{AuditLog, CreateAuditLog};
use playlistfox_db::repositories::AuditLogRepo;
use playlistfox_db::DbPool;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/audit
///
/// The caller's audit entries, newest first.
pub async fn list_audit(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<AuditLog>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);
    let entries = AuditLogRepo::list_for_user(&state.pool, auth.user_id, limit, offset).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// Append an audit entry. Failures are logged and never fail the request.
pub(crate) async fn record(pool: &DbPool, entry: CreateAuditLog) {
    if let Err(e) = AuditLogRepo::insert(pool, &entry).await {
        tracing::error!(
            error = %e,
            action = entry.action,
            entity_type = entry.entity_type,
            entity_id = ?entry.entity_id,
            "Failed to write audit log",
        );
    }
}

/// Serialize an entity for an audit snapshot.
pub(crate) fn snapshot<T: serde::Serialize>(value: &T) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}
