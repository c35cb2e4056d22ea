use async_trait::async_trait;

/// Errors obtaining a user's upstream access token.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenError {
    /// The user never linked a Spotify account, or unlinked it.
    #[error("User {0} has no linked Spotify account")]
    NotLinked(String),

    /// The identity provider could not be reached or answered with an error.
    #[error("Identity provider error: {0}")]
    Provider(String),
}

/// Supplies a bearer token for a user's Spotify account.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self, user_external_id: &str) -> Result<String, TokenError>;
}
