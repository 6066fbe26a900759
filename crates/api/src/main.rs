use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use touchline_api::background::idle_sweep;
use touchline_api::config::{ServerConfig, StoreKind};
use touchline_api::router::build_app_router;
use touchline_api::state::AppState;
use touchline_core::store::SessionStore;
use touchline_db::{FileSessionStore, MemorySessionStore, PgSessionStore};
use touchline_events::ProgressLog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "touchline_api=debug,touchline_events=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        store = ?config.store,
        start_policy = ?config.start_policy,
        "Loaded server configuration"
    );

    // --- Session store ---
    let store = open_store(&config).await?;

    // --- App state ---
    let state = AppState::new(config.clone(), store);

    // Spawn the progress log (writes all ingestion events to the log).
    let progress_handle = tokio::spawn(ProgressLog::run(state.event_bus.subscribe()));

    // Spawn the idle sweep when a timeout is configured.
    let sweep_cancel = CancellationToken::new();
    let sweep_handle = (config.idle_timeout_secs > 0).then(|| {
        tokio::spawn(idle_sweep::run(
            Arc::clone(&state.engine),
            Arc::clone(&state.event_bus),
            Duration::from_secs(config.idle_timeout_secs),
            sweep_cancel.clone(),
        ))
    });

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    if let Some(handle) = sweep_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Idle sweep stopped");
    }

    // The router (and with it the last bus sender) is gone once serve
    // returns, which closes the channel and lets the log drain.
    let _ = tokio::time::timeout(Duration::from_secs(5), progress_handle).await;
    tracing::info!("Graceful shutdown complete");

    Ok(())
}

/// Open the configured session store, running migrations for Postgres.
async fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match config.store {
        StoreKind::Memory => {
            tracing::warn!("Using in-memory session store; completed sessions are lost on restart");
            Arc::new(MemorySessionStore::new())
        }
        StoreKind::File => {
            let store = FileSessionStore::open(config.data_dir.clone())
                .await
                .with_context(|| format!("Failed to open data dir {}", config.data_dir.display()))?;
            tracing::info!(data_dir = %store.dir().display(), "File session store ready");
            Arc::new(store)
        }
        StoreKind::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;

            let pool = touchline_db::create_pool(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connection pool created");

            touchline_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            tracing::info!("Database health check passed");

            touchline_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            Arc::new(PgSessionStore::new(pool))
        }
    };
    Ok(store)
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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
