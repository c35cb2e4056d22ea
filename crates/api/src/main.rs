use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use playlistfox_api::background::scheduled_sync;
use playlistfox_api::config::ServerConfig;
use playlistfox_api::error::set_expose_internal_errors;
use playlistfox_api::router::build_app_router;
use playlistfox_api::state::AppState;

/// How long shutdown waits for a scheduled run in progress.
const SCHEDULER_DRAIN: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "playlistfox_api=debug,playlistfox_sync=info,tower_http=debug".into()
    });
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    set_expose_internal_errors(config.is_development());
    tracing::info!(
        host = %config.host,
        port = %config.port,
        app_env = %config.app_env,
        scheduler = config.scheduler_interval.is_some(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = playlistfox_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    playlistfox_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    playlistfox_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- App state ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let scheduler_interval = config.scheduler_interval;
    let state = AppState::new(pool, config);

    // --- Sync scheduler ---
    let scheduler_cancel = CancellationToken::new();
    let scheduler_handle = scheduler_interval.map(|period| {
        let driver = Arc::clone(&state.sync);
        let cancel = scheduler_cancel.clone();
        tokio::spawn(async move {
            scheduled_sync::run(driver, period, cancel).await;
        })
    });

    // --- Router ---
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    scheduler_cancel.cancel();
    if let Some(handle) = scheduler_handle {
        // Cancellation is observed between ticks; a run in progress gets
        // SCHEDULER_DRAIN to finish before the runtime drops it.
        match tokio::time::timeout(SCHEDULER_DRAIN, handle).await {
            Ok(_) => tracing::info!("Sync scheduler stopped"),
            Err(_) => tracing::warn!(
                drain_secs = SCHEDULER_DRAIN.as_secs(),
                "Sync scheduler still running at shutdown, abandoning the current run"
            ),
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
