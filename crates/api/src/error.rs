use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use playlistfox_core::error::CoreError;
use playlistfox_spotify::SpotifyError;
use playlistfox_sync::{SyncError, TokenError};
use serde_json::json;

/// Message returned for 5xx errors when details are hidden.
const INTERNAL_MESSAGE: &str = "An internal error occurred";

static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Show the underlying message of internal errors in responses.
///
/// Set once at startup when `APP_ENV=development`.
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

fn internal_message(detail: impl std::fmt::Display) -> String {
    if EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed) {
        detail.to_string()
    } else {
        INTERNAL_MESSAGE.to_string()
    }
}

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors, the upstream and sync errors, and
/// adds HTTP-specific variants. Implements [`IntoResponse`] to produce
/// consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `playlistfox_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A Spotify Web API failure.
    #[error(transparent)]
    Spotify(#[from] SpotifyError),

    /// The caller's Spotify credential could not be obtained.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Spotify(e) => Self::Spotify(e),
            SyncError::Database(e) => Self::Database(e),
            SyncError::Core(e) => Self::Core(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut retry_after = None;

        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Upstream(msg) => {
                    tracing::warn!(error = %msg, "Upstream error");
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        internal_message(msg),
                    )
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- Upstream errors ---
            AppError::Spotify(err) => {
                if let SpotifyError::RateLimited {
                    retry_after: Some(secs),
                } = err
                {
                    retry_after = Some(*secs);
                }
                classify_spotify_error(err)
            }
            AppError::Token(err) => match err {
                TokenError::NotLinked(_) => (
                    StatusCode::UNAUTHORIZED,
                    "SPOTIFY_NOT_LINKED",
                    err.to_string(),
                ),
                TokenError::Provider(msg) => {
                    tracing::warn!(error = %msg, "Identity provider error");
                    (
                        StatusCode::BAD_GATEWAY,
                        "UPSTREAM_ERROR",
                        "Identity provider request failed".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    internal_message(msg),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        let mut response = (status, axum::Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// Classify a Spotify error into an HTTP status, error code, and message.
///
/// Credential problems are the caller's to fix (re-link the account), so
/// they surface as 401 rather than a gateway error.
fn classify_spotify_error(err: &SpotifyError) -> (StatusCode, &'static str, String) {
    match err {
        SpotifyError::Unauthorized(msg) => (
            StatusCode::UNAUTHORIZED,
            "SPOTIFY_UNAUTHORIZED",
            format!("Spotify rejected the credential: {msg}"),
        ),
        SpotifyError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
        SpotifyError::RateLimited { .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "Spotify rate limit reached, try again later".to_string(),
        ),
        SpotifyError::TooManyItems { .. } => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
        }
        SpotifyError::Api { status, message } => {
            tracing::warn!(status, error = %message, "Spotify API error");
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message.clone())
        }
        SpotifyError::Request(e) => {
            tracing::warn!(error = %e, "Spotify request failed");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Spotify request failed".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Foreign key violations map to 400.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            match db_err.code().as_deref() {
                Some("23505") => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    if constraint.starts_with("uq_") {
                        return (
                            StatusCode::CONFLICT,
                            "CONFLICT",
                            format!("Duplicate value violates unique constraint: {constraint}"),
                        );
                    }
                }
                Some("23503") => {
                    return (
                        StatusCode::BAD_REQUEST,
                        "BAD_REQUEST",
                        "Referenced entity does not exist".to_string(),
                    );
                }
                _ => {}
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                internal_message(db_err),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                internal_message(other),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_details_follow_the_exposure_flag() {
        set_expose_internal_errors(true);
        assert_eq!(internal_message("pool timed out"), "pool timed out");
        set_expose_internal_errors(false);
        assert_eq!(internal_message("pool timed out"), INTERNAL_MESSAGE);
    }
}
