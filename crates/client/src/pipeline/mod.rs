//! Specification acquisition pipeline.
//!
//! ### Strategy order
//!
//! 1. `direct`: fetch the target itself when it names a spec document
//! 2. `probe`: conventional spec paths under the target's origin
//! 3. `generic`: heuristic scraping of the rendered page
//! 4. `framework`: framework detection and layered extraction
//!
//! The first strategy returning endpoints wins and is written to the spec
//! cache. Terminal errors (authentication walls, storage failures, broken
//! explicit spec targets) stop the run; anything else is recorded and the
//! next strategy runs.

pub mod strategies;

pub use strategies::{DirectFetch, FrameworkScrape, GenericScrape, PROBE_PATHS, PathProbe, default_strategies};

use crate::fetch::{FetchClient, canonicalize};
use crate::render::{RenderOptions, Renderer};
use specscout_core::{AppConfig, CacheStore, Error, ExtractionResult, SpecInfo, StrategyAttempt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Outcome of one strategy.
#[derive(Debug)]
pub enum Attempt {
    /// A schema-valid result; advances the pipeline when it has no endpoints.
    Found(ExtractionResult),
    /// The strategy does not apply to this target.
    Skipped(String),
    /// Nothing usable; terminal errors still stop the pipeline.
    Failed(Error),
    /// Stop the pipeline with this error.
    Fatal(Error),
}

/// Inputs shared by every strategy for one target.
pub struct StrategyContext<'a> {
    /// Canonicalized target URL.
    pub target: &'a Url,
    pub fetch: &'a FetchClient,
    pub renderer: &'a dyn Renderer,
    pub render_options: RenderOptions,
    /// Per-request timeout for path probes.
    pub probe_timeout: Duration,
}

/// One way of turning a target URL into endpoints.
#[async_trait::async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, cx: &StrategyContext<'_>) -> Attempt;
}

/// Runs strategies in order against a target, with optional caching.
pub struct Pipeline {
    fetch: FetchClient,
    renderer: Arc<dyn Renderer>,
    cache: Option<CacheStore>,
    strategies: Vec<Box<dyn Strategy>>,
    render_options: RenderOptions,
    probe_timeout: Duration,
    ttl: Option<Duration>,
}

impl Pipeline {
    /// Pipeline with the default strategies and no cache.
    pub fn new(fetch: FetchClient, renderer: Arc<dyn Renderer>, config: &AppConfig) -> Self {
        Self {
            fetch,
            renderer,
            cache: None,
            strategies: default_strategies(),
            render_options: RenderOptions::from(config),
            probe_timeout: config.probe_timeout(),
            ttl: config.spec_ttl(),
        }
    }

    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the strategy list, keeping the given order.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn Strategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn cache(&self) -> Option<&CacheStore> {
        self.cache.as_ref()
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    /// Acquire endpoints for `target`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` / `InvalidUrl` for unusable targets
    /// - any terminal strategy error, unchanged
    /// - `Io` when the cache cannot be read or written
    /// - `ExtractionFailed` with every strategy's outcome when none succeeded
    pub async fn acquire(&self, target: &str, force_refresh: bool) -> Result<ExtractionResult, Error> {
        if target.trim().is_empty() {
            return Err(Error::InvalidInput("target must not be empty".into()));
        }
        let url = canonicalize(target).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let key = url.as_str();

        if !force_refresh
            && let Some(cache) = &self.cache
        {
            match cache.get::<ExtractionResult>(key).await {
                Ok(result) => {
                    tracing::info!("spec cache hit for {} ({} endpoints)", key, result.endpoints.len());
                    return Ok(result);
                }
                Err(Error::NotFound(_)) => {}
                Err(Error::Expired(_)) => tracing::debug!("cached spec for {} expired", key),
                Err(e) => return Err(e),
            }
        }

        let cx = StrategyContext {
            target: &url,
            fetch: &self.fetch,
            renderer: self.renderer.as_ref(),
            render_options: self.render_options.clone(),
            probe_timeout: self.probe_timeout,
        };

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let started = Instant::now();
            let outcome = strategy.attempt(&cx).await;
            let elapsed_ms = started.elapsed().as_millis();

            match outcome {
                Attempt::Found(result) if !result.is_empty() => {
                    tracing::info!(
                        "{} strategy found {} endpoints for {} in {}ms",
                        strategy.name(),
                        result.endpoints.len(),
                        key,
                        elapsed_ms
                    );
                    self.store(key, &result).await?;
                    return Ok(result);
                }
                Attempt::Found(_) => {
                    tracing::debug!("{} strategy found a document without operations", strategy.name());
                    attempts.push(attempt_record(strategy.as_ref(), "document has no operations".into()));
                }
                Attempt::Skipped(reason) => {
                    tracing::debug!("{} strategy skipped: {}", strategy.name(), reason);
                    attempts.push(attempt_record(strategy.as_ref(), reason));
                }
                Attempt::Failed(e) if !e.is_terminal() => {
                    tracing::debug!("{} strategy failed after {}ms: {}", strategy.name(), elapsed_ms, e);
                    attempts.push(attempt_record(strategy.as_ref(), e.to_string()));
                }
                Attempt::Failed(e) | Attempt::Fatal(e) => {
                    tracing::warn!("{} strategy stopped acquisition of {}: {}", strategy.name(), key, e);
                    return Err(e);
                }
            }
        }

        tracing::warn!("no strategy produced endpoints for {}", key);
        Err(Error::ExtractionFailed { attempts })
    }

    async fn store(&self, key: &str, result: &ExtractionResult) -> Result<(), Error> {
        let Some(cache) = &self.cache else {
            return Ok(());
        };
        let info = SpecInfo {
            title: result.api_info.title.clone(),
            version: result.api_info.version.clone(),
            spec_type: result
                .spec_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| result.framework.to_string()),
        };
        match cache.put(key, result, self.ttl, info).await {
            Ok(_) => Ok(()),
            Err(Error::Io(msg)) => Err(Error::Io(msg)),
            Err(e) => Err(Error::Io(e.to_string())),
        }
    }
}

fn attempt_record(strategy: &dyn Strategy, outcome: String) -> StrategyAttempt {
    StrategyAttempt { strategy: strategy.name().to_string(), outcome }
}
