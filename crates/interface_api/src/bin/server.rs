//! Ledger API Server Binary
//!
//! This binary starts the HTTP API server for the account ledger.
//!
//! # Usage
//!
//! ```bash
//! # Run against an in-memory ledger
//! cargo run --bin ledger-api
//!
//! # Run against PostgreSQL
//! API_DATABASE_URL=postgres://... cargo run --bin ledger-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_DATABASE_URL` - PostgreSQL connection string; in-memory ledger when unset
//! * `API_LOCK_TIMEOUT_MS` - Row lock wait budget (default: 5000)
//! * `API_VERIFICATION_THRESHOLD` - Bill amount that requires a document (default: 10000)
//! * `API_TIMEZONE` - Timezone for spending limit windows (default: UTC)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)

use domain_ledger::{InMemoryLedgerStore, LedgerService, LedgerStore};
use infra_db::{create_pool, run_migrations, DatabaseConfig, PgLedgerStore};
use interface_api::{config::ApiConfig, create_router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().unwrap_or_else(|error| {
        eprintln!("invalid API configuration ({error}), using defaults");
        ApiConfig::default()
    });

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting ledger API server"
    );

    let store = create_store(&config).await?;
    let ledger = Arc::new(LedgerService::new(store, config.ledger_config()));

    let app = create_router(ledger, config.clone());

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Builds the ledger store named by the configuration.
///
/// Connects and migrates PostgreSQL when a database URL is configured,
/// otherwise keeps the ledger in process memory.
async fn create_store(config: &ApiConfig) -> anyhow::Result<Arc<dyn LedgerStore>> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("No database configured, ledger state is kept in memory");
        return Ok(Arc::new(InMemoryLedgerStore::new()));
    };

    tracing::info!("Connecting to database...");
    let db_config = DatabaseConfig::new(url)
        .max_connections(config.database_max_connections)
        .lock_timeout(config.lock_timeout());
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database ready");

    Ok(Arc::new(
        PgLedgerStore::new(pool).with_lock_timeout(config.lock_timeout()),
    ))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
