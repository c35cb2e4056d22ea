use reqwest::StatusCode;
use serde::Deserialize;

/// Errors from the Spotify Web API layer.
#[derive(Debug, thiserror::Error)]
pub enum SpotifyError {
    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The bearer token was missing, expired, or lacked a scope.
    #[error("Spotify rejected the access token: {0}")]
    Unauthorized(String),

    /// The addressed playlist, track, or device does not exist.
    #[error("Spotify resource not found: {0}")]
    NotFound(String),

    /// Spotify is rate limiting this app.
    #[error("Spotify rate limit hit (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    /// Any other non-2xx status.
    #[error("Spotify API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A batch exceeded the per-request item limit.
    #[error("Too many items in one request: {count} (max {max})")]
    TooManyItems { count: usize, max: usize },
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl SpotifyError {
    /// Map a non-success status and its raw body to an error variant.
    ///
    /// Spotify error bodies look like `{"error":{"status":404,"message":"..."}}`;
    /// anything else is kept verbatim.
    pub fn from_status(status: StatusCode, retry_after: Option<u64>, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| body.trim().to_string());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited { retry_after },
            other => Self::Api {
                status: other.as_u16(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn spotify_error_body_message_is_extracted() {
        let err = SpotifyError::from_status(
            StatusCode::NOT_FOUND,
            None,
            r#"{"error":{"status":404,"message":"Resource not found"}}"#,
        );
        assert_matches!(err, SpotifyError::NotFound(msg) if msg == "Resource not found");
    }

    #[test]
    fn unauthorized_and_forbidden_collapse() {
        assert_matches!(
            SpotifyError::from_status(StatusCode::UNAUTHORIZED, None, ""),
            SpotifyError::Unauthorized(_)
        );
        assert_matches!(
            SpotifyError::from_status(StatusCode::FORBIDDEN, None, "nope"),
            SpotifyError::Unauthorized(msg) if msg == "nope"
        );
    }

    #[test]
    fn rate_limit_keeps_retry_after() {
        assert_matches!(
            SpotifyError::from_status(StatusCode::TOO_MANY_REQUESTS, Some(7), ""),
            SpotifyError::RateLimited { retry_after: Some(7) }
        );
    }

    #[test]
    fn other_status_keeps_raw_body() {
        let err = SpotifyError::from_status(StatusCode::BAD_GATEWAY, None, "upstream down ");
        assert_matches!(err, SpotifyError::Api { status: 502, message } if message == "upstream down");
        assert_eq!(
            SpotifyError::Api { status: 500, message: "x".into() }.to_string(),
            "Spotify API error (500): x"
        );
    }
}
