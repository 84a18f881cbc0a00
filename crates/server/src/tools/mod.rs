//! MCP tool implementations.
//!
//! This module contains all tools exposed by the specscout server. Every
//! tool answers with one pretty-printed JSON text block.

pub mod cache;
pub mod spec_discover;
pub mod spec_fetch;

pub use cache::{CacheClearParams, CacheListParams};
pub use spec_discover::SpecDiscoverParams;
pub use spec_fetch::SpecFetchParams;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use specscout_core::Error;

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| Error::Io(format!("failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
