//! cache_clear tool implementation.
//!
//! Removes one target's entries, or everything when no target is given.

use crate::tools::json_result;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use specscout_client::SpecService;

/// Parameters for the cache_clear tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearParams {
    /// Spec URL, cache key, or provider name to remove. Omit to clear
    /// both caches entirely.
    #[serde(default)]
    pub target: Option<String>,
}

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheClearOutput {
    /// Spec entries removed.
    pub specs_removed: usize,
    /// Discovery entries removed.
    pub providers_removed: usize,
}

/// Implementation of the cache_clear tool.
pub async fn clear_impl(service: &SpecService, params: CacheClearParams) -> Result<CallToolResult, McpError> {
    let target = params.target.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let specs_removed = match (service.pipeline().cache(), target) {
        (Some(cache), Some(target)) => cache.delete(target).await?,
        (Some(cache), None) => cache.clear().await?,
        (None, _) => 0,
    };
    let providers_removed = match (service.discovery().cache(), target) {
        (Some(cache), Some(target)) => cache.delete(target).await?,
        (Some(cache), None) => cache.clear().await?,
        (None, _) => 0,
    };

    tracing::info!("cleared {} spec and {} discovery entries", specs_removed, providers_removed);
    json_result(&CacheClearOutput { specs_removed, providers_removed })
}
