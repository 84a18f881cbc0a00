//! cache_list tool implementation.

use crate::tools::json_result;
use chrono::Utc;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use specscout_client::SpecService;
use specscout_core::cache::{CacheListing, DiscoveryCacheEntry};

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Include entries past their expiry.
    #[serde(default)]
    pub include_expired: bool,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheListOutput {
    /// Cached specifications, newest first.
    pub specs: Vec<CacheListing>,
    /// Cached provider resolutions.
    pub providers: Vec<DiscoveryCacheEntry>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(service: &SpecService, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let specs = match service.pipeline().cache() {
        Some(cache) => cache.list(params.include_expired).await?,
        None => Vec::new(),
    };

    let now = Utc::now();
    let providers = match service.discovery().cache() {
        Some(cache) => cache
            .list()
            .await?
            .into_iter()
            .filter(|entry| params.include_expired || !entry.is_expired_at(now))
            .collect(),
        None => Vec::new(),
    };

    json_result(&CacheListOutput { specs, providers })
}
