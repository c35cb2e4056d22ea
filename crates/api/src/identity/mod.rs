//! Client for the identity provider's backend API.
//!
//! Only one call is needed: fetching the Spotify OAuth access token the
//! provider holds for a user. The same client serves request handlers and
//! the sync job through [`AccessTokenSource`].

use async_trait::async_trait;
use playlistfox_sync::{AccessTokenSource, TokenError};
use serde::Deserialize;

/// OAuth provider slug under which Spotify tokens are stored.
const SPOTIFY_PROVIDER: &str = "oauth_spotify";

/// One OAuth token entry as returned by the provider.
#[derive(Debug, Deserialize)]
pub struct OAuthAccessToken {
    pub token: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    api_url: String,
    secret_key: String,
}

impl std::fmt::Debug for IdentityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl IdentityClient {
    pub fn new(client: reqwest::Client, api_url: &str, secret_key: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    fn token_url(&self, user_external_id: &str) -> String {
        format!(
            "{}/users/{user_external_id}/oauth_access_tokens/{SPOTIFY_PROVIDER}",
            self.api_url
        )
    }
}

#[async_trait]
impl AccessTokenSource for IdentityClient {
    async fn access_token(&self, user_external_id: &str) -> Result<String, TokenError> {
        let response = self
            .client
            .get(self.token_url(user_external_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| TokenError::Provider(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TokenError::NotLinked(user_external_id.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                user_id = %user_external_id,
                status = status.as_u16(),
                "Identity provider token lookup failed",
            );
            return Err(TokenError::Provider(format!(
                "token lookup returned {status}: {}",
                body.trim()
            )));
        }

        let tokens: Vec<OAuthAccessToken> = response
            .json()
            .await
            .map_err(|e| TokenError::Provider(e.to_string()))?;
        first_token(tokens, user_external_id)
    }
}

fn first_token(tokens: Vec<OAuthAccessToken>, user_external_id: &str) -> Result<String, TokenError> {
    tokens
        .into_iter()
        .map(|t| t.token)
        .find(|t| !t.is_empty())
        .ok_or_else(|| TokenError::NotLinked(user_external_id.to_string()))
}
