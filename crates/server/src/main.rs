//! quicksave MCP server entry point.
//!
//! Boots the document service over the SQLite store and serves it on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use quicksave_core::{AppConfig, DocumentService, SqliteStore};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
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
        db_path = %config.db_path.display(),
        ttl_ms = config.cache_ttl_ms,
        "Starting quicksave server on stdio transport"
    );

    let store = SqliteStore::open(&config.db_path, Some(config.quota_bytes)).await?;
    let service = Arc::new(DocumentService::from_config(store, &config));

    let handler = handler::QuicksaveServer::new(service);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
