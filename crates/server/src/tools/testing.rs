//! A service whose network and model are unreachable.

use async_trait::async_trait;
use lessonlens_client::fetch::{FetchResponse, HttpFetcher, Url};
use lessonlens_client::{CompletionClient, LlmError};
use lessonlens_core::{AppConfig, CacheDb, Error};
use lessonlens_enrich::EnrichmentService;
use rmcp::model::CallToolResult;
use std::sync::Arc;

struct Offline;

#[async_trait]
impl HttpFetcher for Offline {
    async fn head(&self, _url: &Url) -> Result<Option<String>, Error> {
        Ok(None)
    }

    async fn get(&self, url: &Url) -> Result<FetchResponse, Error> {
        Err(Error::HttpError(format!("{url}: network is offline")))
    }
}

#[async_trait]
impl CompletionClient for Offline {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        Err(LlmError::MissingApiKey)
    }
}

pub async fn offline_service() -> Arc<EnrichmentService> {
    let db = CacheDb::open_in_memory().await.unwrap();
    Arc::new(EnrichmentService::new(db, Arc::new(Offline), Arc::new(Offline), &AppConfig::default()))
}

/// Parse the JSON text of a tool result.
pub fn output_json(result: &CallToolResult) -> serde_json::Value {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
