//! Posting engine API server binary
//!
//! # Environment Variables
//!
//! * `API_HOST` / `API_PORT` - bind address (default 0.0.0.0:8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_SYSTEM_CURRENCY` - ledger equivalent currency (e.g. USD)
//! * `API_LOG_LEVEL` - trace, debug, info, warn, error (default info)
//! * `API_MASTER__ACCOUNTS__*` - posting account ids (required)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_db::{create_pool_from_url, PgPostingStore};
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState, MasterData};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::load().unwrap_or_default();
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting posting API server"
    );

    let master = MasterData::from_config(&config)?;
    let pool = create_pool_from_url(&config.database_url).await?;
    let store = Arc::new(PgPostingStore::new(pool));

    let app = create_router(AppState::new(store, master));

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can drain
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
