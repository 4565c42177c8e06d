use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use chronicle_api::{AppState, AppStateInner};
use chronicle_gateway::ChatHub;
use chronicle_server::app;
use chronicle_server::config::Config;
use chronicle_server::pipeline::Pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chronicle=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let config = Config::from_env()?;

    // Init store
    let db = chronicle_db::Database::open(&config.db_path)?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner { db });
    let hub = ChatHub::new();

    // The stage list is validated before any route is wired up
    let pipeline = Pipeline::validate(&Pipeline::STANDARD)?;
    let router = app::build_router(&pipeline, state, hub, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Chronicle server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
