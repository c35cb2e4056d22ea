//! Session authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use playlistfox_core::error::CoreError;
use playlistfox_core::types::DbId;
use playlistfox_db::models::user::UpsertUser;
use playlistfox_db::repositories::UserRepo;

use crate::error::AppError;
use crate::state::AppState;

/// Cookie the identity provider's browser SDK stores the session token in.
pub const SESSION_COOKIE: &str = "__session";

/// Authenticated user resolved from a session token.
///
/// The token is read from `Authorization: Bearer <token>` or, failing that,
/// the `__session` cookie. A user the database has not seen yet (the
/// `user.created` webhook may lag the first request) is created from the
/// token claims. A user removed by the `user.deleted` webhook is rejected
/// even while their session token is still valid.
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = auth.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Internal database id.
    pub user_id: DbId,
    /// Identity provider id (`sub` claim).
    pub external_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing session token".into()))
        })?;

        let claims = state.sessions.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            AppError::Core(CoreError::Unauthorized("Invalid or expired session".into()))
        })?;

        let user = match UserRepo::find_by_external_id(&state.pool, &claims.sub).await? {
            Some(user) => user,
            None if UserRepo::is_deleted(&state.pool, &claims.sub).await? => {
                tracing::info!(external_id = %claims.sub, "Session for deleted user rejected");
                return Err(AppError::Core(CoreError::Unauthorized(
                    "Account has been deleted".into(),
                )));
            }
            None => {
                let user = UserRepo::upsert(
                    &state.pool,
                    &UpsertUser {
                        external_id: claims.sub.clone(),
                        email: claims.email,
                        display_name: claims.name,
                        avatar_url: claims.picture,
                    },
                )
                .await?;
                tracing::info!(user_id = user.id, external_id = %user.external_id, "User created from session");
                user
            }
        };

        Ok(AuthUser {
            user_id: user.id,
            external_id: user.external_id,
        })
    }
}

/// Extract the session token from the bearer header or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.trim())
            .filter(|t| !t.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(COOKIE, HeaderValue::from_static("__session=def"));
        assert_eq!(session_token(&headers), Some("abc"));
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; __session=tok.en.sig; __client_uat=1"),
        );
        assert_eq!(session_token(&headers), Some("tok.en.sig"));
    }

    #[test]
    fn non_bearer_authorization_falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(session_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("__session=xyz"));
        assert_eq!(session_token(&headers), Some("xyz"));
    }
}
