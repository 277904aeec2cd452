//! cache_purge tool implementation.
//!
//! Purges pages by domain, classification results by kind, extracted
//! text, or model replies.

use crate::tools::json_result;
use lessonlens_core::Error;
use lessonlens_enrich::{ClassifierKind, EnrichmentService, PurgeTarget};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Purge pages and their text whose URL matches this domain pattern.
    pub domain: Option<String>,

    /// Purge classification results of this kind.
    pub kind: Option<ClassifierKind>,

    /// Purge all extracted text; raw pages are kept and re-extracted on demand.
    #[serde(default)]
    pub text: bool,

    /// Purge all stored model replies.
    #[serde(default)]
    pub prompts: bool,
}

impl CachePurgeParams {
    fn targets(self) -> Vec<PurgeTarget> {
        let mut targets = Vec::new();
        if let Some(domain) = self.domain {
            targets.push(PurgeTarget::Domain(domain));
        }
        if let Some(kind) = self.kind {
            targets.push(PurgeTarget::Results(kind));
        }
        if self.text {
            targets.push(PurgeTarget::Text);
        }
        if self.prompts {
            targets.push(PurgeTarget::Prompts);
        }
        targets
    }
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
}

pub async fn purge_impl(service: &EnrichmentService, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let targets = params.targets();
    if targets.is_empty() {
        return Err(
            Error::InvalidInput("At least one of domain, kind, text, or prompts must be specified".to_string()).into(),
        );
    }

    let mut deleted = 0u64;
    for target in targets {
        deleted += service.purge(target).await?;
    }

    json_result(&CachePurgeOutput { deleted })
}
