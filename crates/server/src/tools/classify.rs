//! classify tool implementation.

use super::json_result;
use lessonlens_core::Error;
use lessonlens_enrich::{Classification, ClassifierKind, Document, EnrichmentService};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for the classify tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClassifyParams {
    /// One of `educational_level`, `resource_type`, `subject`, `educational_role`,
    /// `educational_use`, `assesses`, `teaches` or `snippet`.
    pub kind: ClassifierKind,

    /// Documents to classify, each with a URL and its text.
    pub documents: Vec<Document>,

    /// Information need; required for `snippet`.
    #[serde(default)]
    pub facet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClassifyOutput {
    pub classifications: Vec<Classification>,
}

pub async fn classify_impl(service: &EnrichmentService, params: ClassifyParams) -> Result<CallToolResult, McpError> {
    if params.documents.is_empty() {
        return Err(Error::InvalidInput("documents cannot be empty".into()).into());
    }

    let classifications = service
        .classify(params.kind, &params.documents, params.facet.as_deref())
        .await?;
    json_result(&ClassifyOutput { classifications })
}
