//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SPECSCOUT_*)
//! 2. TOML config file (if SPECSCOUT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SPECSCOUT_*)
/// 2. TOML config file (if SPECSCOUT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the spec manifest, blobs, and discovery index.
    ///
    /// Set via SPECSCOUT_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SPECSCOUT_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SPECSCOUT_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout for direct fetches and discovery, in milliseconds.
    ///
    /// Set via SPECSCOUT_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Per-path timeout while probing conventional spec locations.
    ///
    /// Set via SPECSCOUT_PROBE_TIMEOUT_MS environment variable.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Page load budget for rendered extraction.
    ///
    /// Set via SPECSCOUT_RENDER_TIMEOUT_MS environment variable.
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,

    /// Lifetime of cached specs in seconds. Unset means entries never expire.
    ///
    /// Set via SPECSCOUT_SPEC_TTL_SECS environment variable.
    #[serde(default = "default_spec_ttl_secs")]
    pub spec_ttl_secs: Option<u64>,

    /// Base URL of the provider search surface.
    ///
    /// Set via SPECSCOUT_SEARCH_BASE_URL environment variable.
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,

    /// Minimum spacing between requests to the search surface.
    ///
    /// Set via SPECSCOUT_SEARCH_MIN_INTERVAL_MS environment variable.
    #[serde(default = "default_search_min_interval_ms")]
    pub search_min_interval_ms: u64,

    /// Whether rendered mode (headless browser) is enabled.
    ///
    /// Set via SPECSCOUT_RENDER_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub render_enabled: bool,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./.specscout-cache")
}

fn default_user_agent() -> String {
    "specscout/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

fn default_render_timeout_ms() -> u64 {
    30_000
}

fn default_spec_ttl_secs() -> Option<u64> {
    Some(86_400)
}

fn default_search_base_url() -> String {
    "https://apitracker.io".into()
}

fn default_search_min_interval_ms() -> u64 {
    1_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            render_timeout_ms: default_render_timeout_ms(),
            spec_ttl_secs: default_spec_ttl_secs(),
            search_base_url: default_search_base_url(),
            search_min_interval_ms: default_search_min_interval_ms(),
            render_enabled: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn search_min_interval(&self) -> Duration {
        Duration::from_millis(self.search_min_interval_ms)
    }

    /// Spec cache TTL; `None` means cached specs never expire.
    pub fn spec_ttl(&self) -> Option<Duration> {
        self.spec_ttl_secs.map(Duration::from_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SPECSCOUT_`
    /// 2. TOML file from `SPECSCOUT_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SPECSCOUT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SPECSCOUT_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from("./.specscout-cache"));
        assert_eq!(config.user_agent, "specscout/0.1");
        assert_eq!(config.max_bytes, 10_485_760);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.probe_timeout_ms, 5_000);
        assert_eq!(config.spec_ttl_secs, Some(86_400));
        assert!(config.render_enabled);
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.probe_timeout(), Duration::from_millis(5_000));
        assert_eq!(config.spec_ttl(), Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_load_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SPECSCOUT_TIMEOUT_MS", "1500");
            jail.set_env("SPECSCOUT_RENDER_ENABLED", "false");
            jail.set_env("SPECSCOUT_CACHE_DIR", "/tmp/specscout-test");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.timeout_ms, 1500);
            assert!(!config.render_enabled);
            assert_eq!(config.cache_dir, PathBuf::from("/tmp/specscout-test"));
            Ok(())
        });
    }

    #[test]
    fn test_load_toml_file_then_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("specscout.toml", "probe_timeout_ms = 2500\nuser_agent = \"from-file\"\n")?;
            jail.set_env("SPECSCOUT_CONFIG_FILE", "specscout.toml");
            jail.set_env("SPECSCOUT_USER_AGENT", "from-env");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.probe_timeout_ms, 2500);
            assert_eq!(config.user_agent, "from-env");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SPECSCOUT_TIMEOUT_MS", "5");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
