//! Cache-related MCP tools.
//!
//! Both tools cover the spec cache and the discovery cache together.

pub mod clear;
pub mod list;

pub use clear::{CacheClearParams, clear_impl};
pub use list::{CacheListParams, list_impl};
