//! MCP server handler implementation.
//!
//! Routes tool calls to the implementations in [`crate::tools`], all of
//! which share one [`EnrichmentService`].
use crate::tools::{
    CachePurgeParams, ClassifyParams, EnhanceSnippetsParams, EnrichParams, FetchTextParams, classify_impl,
    enhance_snippets_impl, enrich_impl, fetch_text_impl, purge_impl, stats_impl, summarize_impl,
};

use lessonlens_enrich::EnrichmentService;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct LessonLensServer {
    service: Arc<EnrichmentService>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl LessonLensServer {
    pub fn new(service: Arc<EnrichmentService>) -> Self {
        Self { service, tool_router: Self::tool_router() }
    }

    #[tool(description = "Fetch a page (HTML, PDF or DOCX) and return its extracted text. Results are cached.")]
    async fn fetch_text(&self, params: Parameters<FetchTextParams>) -> Result<CallToolResult, McpError> {
        fetch_text_impl(&self.service, params.0).await
    }

    #[tool(
        description = "Classify documents by educational level, resource type, subject, educational role or educational use, describe what they assess or teach, or write a snippet for an information need (kind=snippet, facet required)."
    )]
    async fn classify(&self, params: Parameters<ClassifyParams>) -> Result<CallToolResult, McpError> {
        classify_impl(&self.service, params.0).await
    }

    #[tool(
        description = "Enrich search results with educational level, resource type and subject, using page text when available."
    )]
    async fn enrich(&self, params: Parameters<EnrichParams>) -> Result<CallToolResult, McpError> {
        enrich_impl(&self.service, params.0).await
    }

    #[tool(description = "Rewrite search result snippets so they answer the given information need.")]
    async fn enhance_snippets(&self, params: Parameters<EnhanceSnippetsParams>) -> Result<CallToolResult, McpError> {
        enhance_snippets_impl(&self.service, params.0).await
    }

    #[tool(description = "Enrich search results and report the percentage of results per label.")]
    async fn summarize(&self, params: Parameters<EnrichParams>) -> Result<CallToolResult, McpError> {
        summarize_impl(&self.service, params.0).await
    }

    #[tool(description = "Report cache entry counts and hit/miss counters.")]
    async fn cache_stats(&self) -> Result<CallToolResult, McpError> {
        stats_impl(&self.service).await
    }

    #[tool(description = "Purge cached pages by domain, classification results by kind, extracted text or model replies.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.service, params.0).await
    }
}

impl ServerHandler for LessonLensServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "lessonlens".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Educational enrichment of web search results: page text, metadata labels, snippets and summaries."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
