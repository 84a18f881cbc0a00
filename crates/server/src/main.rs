//! specscout server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use specscout_client::SpecService;
use specscout_core::AppConfig;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        cache_dir = %config.cache_dir.display(),
        render = config.render_enabled,
        "Starting specscout server on stdio transport"
    );

    let service = Arc::new(SpecService::from_config(&config).await?);
    let handler = handler::SpecScoutServer::new(Arc::clone(&service));
    let server = serve_server(handler, stdio()).await?;

    let quit = server.waiting().await;
    service.shutdown().await;
    tracing::info!("specscout server stopped");
    quit?;

    Ok(())
}
