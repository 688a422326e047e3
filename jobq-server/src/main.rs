//! jobq server
//!
//! Entry point: configuration loading, store bootstrap and HTTP server startup.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use jobq_db_connection::sanitize_database_url;
use jobq_store::SqlJobStore;
use tokio::net::TcpListener;

use jobq_server::state::AppState;

mod bootstrap;
mod cli;
mod config_helpers;
mod tracing_setup;

use bootstrap::prepare_store;
use cli::CliArgs;
use config_helpers::{database_config_from_config, parse_bind_address};
use tracing_setup::install_tracing_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside local development.
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    let config = jobq_config::load_config(args.config_path.as_deref())
        .with_context(|| format!("failed to load configuration from {:?}", args.config_path))?;
    jobq_config::validate_config(&config).context("invalid configuration")?;

    install_tracing_from_config(&config.logging);

    let db_cfg = database_config_from_config(&config)?;
    let db_pool = jobq_db_connection::create_lazy_pool(&db_cfg)
        .context("failed to create database pool")?;
    tracing::info!(
        db_url = %sanitize_database_url(&db_cfg.url),
        db_max_connections = db_cfg.max_connections,
        require_on_startup = config.database.require_on_startup,
        "database configuration"
    );

    let store = SqlJobStore::new(db_pool).with_auto_migrate(config.database.run_migrations);
    prepare_store(&store, &config.database).await?;

    let state = Arc::new(AppState::from_store(store));
    let app = jobq_server::build_router(state);

    let addr = parse_bind_address(&config.server.host, config.server.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("received Ctrl+C, shutting down");
}
