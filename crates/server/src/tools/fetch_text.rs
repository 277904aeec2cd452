//! fetch_text tool implementation.
//!
//! Returns the cached or freshly extracted text of one page.

use super::json_result;
use lessonlens_core::Error;
use lessonlens_enrich::EnrichmentService;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for the fetch_text tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchTextParams {
    /// The URL to fetch.
    pub url: String,
}

/// Output structure for the fetch_text tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchTextOutput {
    pub url: String,
    /// Extracted page text, absent when the page has none.
    pub text: Option<String>,
}

pub async fn fetch_text_impl(service: &EnrichmentService, params: FetchTextParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let text = service.fetch_text(&params.url).await?;
    json_result(&FetchTextOutput { url: params.url, text })
}
