//! Core types and shared functionality for specscout.
//!
//! This crate provides:
//! - File-backed spec and discovery caches with lazy TTL evaluation
//! - The unified error taxonomy
//! - The normalized endpoint / extraction data model
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use cache::{CacheStore, DiscoveryCache, SpecCacheEntry, SpecInfo};
pub use config::{AppConfig, ConfigError};
pub use error::{Error, StrategyAttempt};
pub use models::{ApiInfo, ExtractionResult, Framework, HttpMethod, NormalizedEndpoint, SpecDocument, SpecType};
