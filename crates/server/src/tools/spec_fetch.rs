//! spec_fetch tool implementation.
//!
//! Resolves a URL or provider name to normalized endpoints through the
//! acquisition pipeline.

use super::json_result;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use specscout_client::SpecService;

/// Input parameters for the spec_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SpecFetchParams {
    /// Spec URL, documentation URL, or provider name (e.g. "stripe").
    pub target: String,

    /// Bypass the spec and discovery caches.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Implementation of the spec_fetch tool.
pub async fn fetch_impl(service: &SpecService, params: SpecFetchParams) -> Result<CallToolResult, McpError> {
    let lookup = service.lookup(&params.target, params.force_refresh).await?;
    tracing::debug!(
        "spec_fetch {} -> {} endpoints via {}",
        params.target,
        lookup.result.endpoints.len(),
        lookup.result.strategy
    );
    json_result(&lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::service;

    #[tokio::test]
    async fn test_fetch_empty_target() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path()).await;
        let params = SpecFetchParams { target: "  ".into(), force_refresh: false };

        let err = fetch_impl(&service, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_fetch_unsupported_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path()).await;
        let params = SpecFetchParams { target: "ftp://example.com/openapi.json".into(), force_refresh: false };

        let err = fetch_impl(&service, params).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
    }
}
