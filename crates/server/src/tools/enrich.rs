//! enrich and summarize tool implementations.
//!
//! Both take a list of search results; summarize enriches them first and
//! reports only the label distribution.

use super::json_result;
use lessonlens_core::{Error, SearchResult};
use lessonlens_enrich::EnrichmentService;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for the enrich and summarize tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EnrichParams {
    /// Search results as `{url, title, description}`.
    pub results: Vec<SearchResult>,
}

fn validate(params: &EnrichParams) -> Result<(), Error> {
    if params.results.is_empty() {
        return Err(Error::InvalidInput("results cannot be empty".into()));
    }
    Ok(())
}

pub async fn enrich_impl(service: &EnrichmentService, params: EnrichParams) -> Result<CallToolResult, McpError> {
    validate(&params)?;
    let report = service.enrich(params.results).await?;
    json_result(&report)
}

pub async fn summarize_impl(service: &EnrichmentService, params: EnrichParams) -> Result<CallToolResult, McpError> {
    validate(&params)?;
    let summary = service.summarize(params.results).await?;
    json_result(&summary)
}
