//! MCP tool implementations.
//!
//! Each tool validates its parameters, calls the shared
//! [`EnrichmentService`](lessonlens_enrich::EnrichmentService) and returns
//! its output as pretty-printed JSON text.

pub mod cache;
pub mod classify;
pub mod enrich;
pub mod fetch_text;
pub mod snippets;

#[cfg(test)]
pub(crate) mod testing;

use lessonlens_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

pub use cache::{CachePurgeParams, purge_impl, stats_impl};
pub use classify::{ClassifyParams, classify_impl};
pub use enrich::{EnrichParams, enrich_impl, summarize_impl};
pub use fetch_text::{FetchTextParams, fetch_text_impl};
pub use snippets::{EnhanceSnippetsParams, enhance_snippets_impl};

/// Wrap a tool output as a successful JSON text result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::Serialization(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
