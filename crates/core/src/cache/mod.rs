//! File-backed cache for fetched specifications and provider discovery.
//!
//! Layout under the cache root:
//!
//! - `manifest.json`: key → entry metadata (source, blob reference, timestamps)
//! - `blobs/<key>.json`: one blob per cached specification
//! - `discovery.json`: provider → documentation URL
//!
//! Keys are SHA-256 hashes of the trimmed, lower-cased source string.

mod files;

pub mod discovery;
pub mod hash;
pub mod store;

pub use crate::Error;

pub use discovery::{DISCOVERY_TTL, DiscoveryCache, DiscoveryCacheEntry};
pub use hash::compute_cache_key;
pub use store::{CacheListing, CacheStore, SpecCacheEntry, SpecInfo};
