//! enhance_snippets tool implementation.

use super::json_result;
use lessonlens_core::{Error, SearchResult};
use lessonlens_enrich::EnrichmentService;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for the enhance_snippets tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EnhanceSnippetsParams {
    /// Search results as `{url, title, description}`.
    pub results: Vec<SearchResult>,

    /// The teacher's information need, e.g. "atom models for grade 8".
    pub facet: String,
}

pub async fn enhance_snippets_impl(
    service: &EnrichmentService, params: EnhanceSnippetsParams,
) -> Result<CallToolResult, McpError> {
    if params.results.is_empty() {
        return Err(Error::InvalidInput("results cannot be empty".into()).into());
    }

    let report = service.enhance_snippets(params.results, &params.facet).await?;
    json_result(&report)
}
