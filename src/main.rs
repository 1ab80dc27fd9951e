//! Payment System - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables and command line flags
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build HTTP router around the payment service
//! 5. Serve until SIGINT or SIGTERM

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use payment_system::{
    app,
    config::{Cli, Config},
    db, services,
    store::PgLedgerStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?.with_cli(cli);
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(config.connect_options()?, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let service = services::build(Arc::new(PgLedgerStore::new(pool)));
    let router = app::router(service);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(transport = "HTTP", %addr, "payment system started");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("payment system ended");
    Ok(())
}

/// Resolve on ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!(signal = "SIGINT", "shutting down"),
        () = terminate => tracing::info!(signal = "SIGTERM", "shutting down"),
    }
}
