//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    CacheClearParams, CacheListParams, SpecDiscoverParams, SpecFetchParams, cache, spec_discover, spec_fetch,
};

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
use specscout_client::SpecService;
use std::sync::Arc;

/// The main MCP server handler for specscout.
#[derive(Clone)]
pub struct SpecScoutServer {
    service: Arc<SpecService>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SpecScoutServer {
    /// Create a new server handler around a shared service.
    pub fn new(service: Arc<SpecService>) -> Self {
        Self { service, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Fetch the API endpoints for a spec URL, documentation URL, or provider name. Tries direct fetch, conventional spec paths, then rendered page extraction. Returns JSON with framework, strategy, api_info, and endpoints."
    )]
    async fn spec_fetch(&self, params: Parameters<SpecFetchParams>) -> Result<CallToolResult, McpError> {
        spec_fetch::fetch_impl(&self.service, params.0).await
    }

    #[tool(description = "Resolve an API provider name to its documentation URL.")]
    async fn spec_discover(&self, params: Parameters<SpecDiscoverParams>) -> Result<CallToolResult, McpError> {
        spec_discover::discover_impl(&self.service, params.0).await
    }

    #[tool(description = "List cached specifications and provider resolutions.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        cache::list_impl(&self.service, params.0).await
    }

    #[tool(description = "Remove cached entries for one target or provider, or everything when no target is given.")]
    async fn cache_clear(&self, params: Parameters<CacheClearParams>) -> Result<CallToolResult, McpError> {
        cache::clear_impl(&self.service, params.0).await
    }
}

impl ServerHandler for SpecScoutServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "specscout".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Use spec_fetch with a URL or provider name to get an API's endpoints. spec_discover only finds the documentation URL."
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;

    #[tokio::test]
    async fn test_registers_every_tool() {
        let dir = tempfile::tempdir().unwrap();
        let server = SpecScoutServer::new(Arc::new(testing::service(dir.path()).await));

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["cache_clear", "cache_list", "spec_discover", "spec_fetch"]);
    }
}
