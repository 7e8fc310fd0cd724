//! docqa HTTP server
//!
//! Run with: cargo run -p docqa --bin docqa-server
//! Set DOCQA_CONFIG to a TOML file to override the defaults.

use docqa::{config::DocQaConfig, server::DocQaServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var_os("DOCQA_CONFIG").map(PathBuf::from);
    let config = DocQaConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Service: {}", config.service.base_url);
    tracing::info!("  - Model: {}", config.service.model);
    tracing::info!("  - Default strategy: {}", config.submission.strategy);
    tracing::info!(
        "  - Readiness polling: every {}ms, at most {} checks",
        config.submission.poll_interval_ms,
        config.submission.max_poll_attempts
    );
    if let Some(path) = &config.document.default_path {
        tracing::info!("  - Default document: {}", path.display());
    }

    let server = DocQaServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/ask  - Ask a question about a document");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
