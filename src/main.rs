// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use dashboard_builder::infrastructure::config::load_app_config;
use dashboard_builder::infrastructure::memory_repository::InMemoryRepository;
use dashboard_builder::presentation::router::build_router;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create repository (infrastructure layer)
    let repository = if config.server.seed_demo {
        Arc::new(InMemoryRepository::with_demo_data())
    } else {
        Arc::new(InMemoryRepository::new())
    };

    // Build router (presentation layer)
    let router = build_router(repository);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting dashboard backend on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
