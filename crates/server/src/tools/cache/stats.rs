//! cache_stats tool implementation.
//!
//! Entry counts come from the database; hit/miss counters cover the
//! current process only.

use crate::tools::json_result;
use lessonlens_enrich::EnrichmentService;
use rmcp::{ErrorData as McpError, model::CallToolResult};

pub async fn stats_impl(service: &EnrichmentService) -> Result<CallToolResult, McpError> {
    let stats = service.stats().await?;
    json_result(&stats)
}
