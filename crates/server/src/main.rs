//! lessonlens server entry point.
//!
//! Boots the MCP server on stdio transport. Logging goes to stderr to
//! avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use lessonlens_client::{AnthropicClient, FetchClient, FetchConfig};
use lessonlens_core::{AppConfig, CacheDb};
use lessonlens_enrich::EnrichmentService;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
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
    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = FetchClient::new(FetchConfig::from(&config))?;
    let llm = AnthropicClient::from_app_config(&config)?;
    let service = Arc::new(EnrichmentService::new(db, Arc::new(fetcher), Arc::new(llm), &config));

    tracing::info!(db_path = %config.db_path.display(), model = %config.model, "Starting lessonlens server on stdio transport");

    let handler = handler::LessonLensServer::new(service);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
