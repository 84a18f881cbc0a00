//! spec_discover tool implementation.
//!
//! Resolves a provider name to its documentation URL without acquiring the
//! spec.

use super::json_result;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use specscout_client::SpecService;

/// Input parameters for the spec_discover tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SpecDiscoverParams {
    /// Provider or product name (e.g. "open weather").
    pub query: String,

    /// Skip the discovery cache.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Implementation of the spec_discover tool.
pub async fn discover_impl(service: &SpecService, params: SpecDiscoverParams) -> Result<CallToolResult, McpError> {
    let discovery = service.discovery().resolve(&params.query, params.force_refresh).await?;
    json_result(&discovery)
}
