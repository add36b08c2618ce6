mod auth;
mod config;
mod db;
mod error;
mod extractors;
mod forms;
mod mail;
mod market;
mod repository;
mod routes;
mod social;
mod state;

use std::net::SocketAddr;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Config};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let db_path = db::resolve_db_path(&config);
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;

    // Outbound mail: falls back to log-only delivery when unconfigured
    let mailer = mail::from_config(&config.mail);

    if config.payments.api_key.is_none() {
        tracing::warn!("Payments API key not configured; card payments disabled");
    }

    let state = AppState {
        db: pool,
        config: config.clone(),
        mailer,
    };

    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
