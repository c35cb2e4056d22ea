use std::sync::Arc;

use playlistfox_core::webhook_signature::WebhookVerifier;
use playlistfox_spotify::SpotifyClient;
use playlistfox_sync::{PgSyncStore, SyncDriver};

use crate::auth::session::SessionVerifier;
use crate::config::ServerConfig;
use crate::identity::IdentityClient;

/// The sync driver wired to Spotify, Postgres, and the identity provider.
pub type SyncRunner = SyncDriver<SpotifyClient, PgSyncStore, IdentityClient>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: playlistfox_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Spotify Web API client.
    pub spotify: SpotifyClient,
    /// Identity provider backend client (Spotify token lookup).
    pub identity: IdentityClient,
    /// Session token verifier.
    pub sessions: Arc<SessionVerifier>,
    /// Identity webhook signature verifier.
    pub webhooks: Arc<WebhookVerifier>,
    /// Sync driver; holds the run lock shared by cron, API, and scheduler.
    pub sync: Arc<SyncRunner>,
}

impl AppState {
    /// Wire up clients and verifiers from configuration.
    ///
    /// # Panics
    ///
    /// Panics if the session public key or webhook secret cannot be parsed,
    /// or the HTTP client cannot be built.
    pub fn new(pool: playlistfox_db::DbPool, config: ServerConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout())
            .build()
            .expect("Failed to build reqwest HTTP client");
        let spotify = SpotifyClient::with_client(http.clone(), config.spotify_api_url.clone());
        let identity = IdentityClient::new(
            http,
            &config.identity.api_url,
            &config.identity.secret_key,
        );

        let sessions = SessionVerifier::from_pem(&config.identity.jwt_public_key)
            .expect("IDENTITY_JWT_PUBLIC_KEY must be a PEM-encoded RSA public key");
        let webhooks = WebhookVerifier::from_secret(&config.identity.webhook_secret)
            .expect("IDENTITY_WEBHOOK_SECRET must be a whsec_ base64 secret");

        let sync = SyncDriver::new(
            spotify.clone(),
            PgSyncStore::new(pool.clone()),
            identity.clone(),
            config.sync.clone(),
        );

        Self {
            pool,
            config: Arc::new(config),
            spotify,
            identity,
            sessions: Arc::new(sessions),
            webhooks: Arc::new(webhooks),
            sync: Arc::new(sync),
        }
    }
}
