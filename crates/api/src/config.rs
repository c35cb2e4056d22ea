use std::time::Duration;

use playlistfox_sync::SyncConfig;

/// Server configuration loaded from environment variables.
///
/// Optional settings default to values suitable for local development.
/// Secrets have no default and must be set.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`). Sync triggers are exempt.
    pub request_timeout_secs: u64,
    /// Timeout for each outbound Spotify or identity provider call (default: `15`).
    pub upstream_timeout_secs: u64,
    /// `development` exposes internal error messages in responses.
    pub app_env: String,
    /// Bearer secret expected by the cron trigger.
    pub cron_secret: String,
    /// Base URL of the Spotify Web API.
    pub spotify_api_url: String,
    /// Identity provider settings.
    pub identity: IdentityConfig,
    /// Pacing of sync runs.
    pub sync: SyncConfig,
    /// Period of the in-process scheduler. `None` disables it.
    pub scheduler_interval: Option<Duration>,
}

/// Credentials for the managed identity provider.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Base URL of the provider's backend API.
    pub api_url: String,
    /// Secret key used as bearer for the backend API.
    pub secret_key: String,
    /// PEM-encoded RSA public key that signs session tokens.
    pub jwt_public_key: String,
    /// `whsec_` secret for webhook signatures.
    pub webhook_secret: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// Default base URL of the identity provider's backend API.
pub const DEFAULT_IDENTITY_API_URL: &str = "https://api.clerk.com/v1";

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                       |
    /// |--------------------------------|-------------------------------|
    /// | `HOST`                         | `0.0.0.0`                     |
    /// | `PORT`                         | `3000`                        |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173`       |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                          |
    /// | `UPSTREAM_TIMEOUT_SECS`        | `15`                          |
    /// | `APP_ENV`                      | `production`                  |
    /// | `CRON_SECRET`                  | **required**                  |
    /// | `SPOTIFY_API_URL`              | `https://api.spotify.com/v1`  |
    /// | `IDENTITY_API_URL`             | `https://api.clerk.com/v1`    |
    /// | `IDENTITY_SECRET_KEY`          | **required**                  |
    /// | `IDENTITY_JWT_PUBLIC_KEY`      | **required**                  |
    /// | `IDENTITY_WEBHOOK_SECRET`      | **required**                  |
    /// | `SYNC_GROUP_SIZE`              | `3`                           |
    /// | `SYNC_GROUP_PAUSE_MS`          | `1000`                        |
    /// | `SYNC_BATCH_DELAY_MS`          | `100`                         |
    /// | `SYNC_SCHEDULER_INTERVAL_SECS` | unset (scheduler disabled)    |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or any value fails to parse.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let upstream_timeout_secs: u64 = std::env::var("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("UPSTREAM_TIMEOUT_SECS must be a valid u64");
        assert!(upstream_timeout_secs > 0, "UPSTREAM_TIMEOUT_SECS must be positive");

        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "production".into());

        let spotify_api_url = std::env::var("SPOTIFY_API_URL")
            .unwrap_or_else(|_| playlistfox_spotify::DEFAULT_API_URL.into());

        let identity = IdentityConfig {
            api_url: std::env::var("IDENTITY_API_URL")
                .unwrap_or_else(|_| DEFAULT_IDENTITY_API_URL.into()),
            secret_key: required("IDENTITY_SECRET_KEY"),
            // Deployment platforms often store PEMs with escaped newlines.
            jwt_public_key: required("IDENTITY_JWT_PUBLIC_KEY").replace("\\n", "\n"),
            webhook_secret: required("IDENTITY_WEBHOOK_SECRET"),
        };

        let defaults = SyncConfig::default();
        let sync = SyncConfig {
            group_size: std::env::var("SYNC_GROUP_SIZE")
                .map(|v| v.parse().expect("SYNC_GROUP_SIZE must be a valid usize"))
                .unwrap_or(defaults.group_size),
            group_pause: std::env::var("SYNC_GROUP_PAUSE_MS")
                .map(|v| {
                    Duration::from_millis(
                        v.parse().expect("SYNC_GROUP_PAUSE_MS must be a valid u64"),
                    )
                })
                .unwrap_or(defaults.group_pause),
            batch_delay: std::env::var("SYNC_BATCH_DELAY_MS")
                .map(|v| {
                    Duration::from_millis(
                        v.parse().expect("SYNC_BATCH_DELAY_MS must be a valid u64"),
                    )
                })
                .unwrap_or(defaults.batch_delay),
        };
        assert!(sync.group_size > 0, "SYNC_GROUP_SIZE must be at least 1");

        let scheduler_interval = std::env::var("SYNC_SCHEDULER_INTERVAL_SECS")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| {
                let secs: u64 = v
                    .trim()
                    .parse()
                    .expect("SYNC_SCHEDULER_INTERVAL_SECS must be a valid u64");
                assert!(secs > 0, "SYNC_SCHEDULER_INTERVAL_SECS must be positive");
                Duration::from_secs(secs)
            });

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upstream_timeout_secs,
            app_env,
            cron_secret: required("CRON_SECRET"),
            spotify_api_url,
            identity,
            sync,
            scheduler_interval,
        }
    }

    /// Per-call timeout for the shared outbound HTTP client.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Whether internal error details may be shown to clients.
    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }
}

fn required(name: &str) -> String {
    let value = std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set"));
    assert!(!value.trim().is_empty(), "{name} must not be empty");
    value
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
