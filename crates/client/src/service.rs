//! Entry point tying discovery, acquisition, and caching together.

use crate::discovery::{Discovery, DiscoveryResolver};
use crate::fetch::{FetchClient, FetchConfig, is_url_like};
use crate::pipeline::Pipeline;
use crate::render::{HttpRenderer, Renderer};
use serde::Serialize;
use specscout_core::{AppConfig, CacheStore, Error, ExtractionResult};
use std::sync::Arc;

/// Result of a lookup, with the discovery step when one ran.
#[derive(Debug, Clone, Serialize)]
pub struct Lookup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery: Option<Discovery>,
    #[serde(flatten)]
    pub result: ExtractionResult,
}

pub struct SpecService {
    discovery: DiscoveryResolver,
    pipeline: Pipeline,
}

impl SpecService {
    pub fn new(discovery: DiscoveryResolver, pipeline: Pipeline) -> Self {
        Self { discovery, pipeline }
    }

    /// Service wired from application config.
    ///
    /// Uses headless Chrome when the `render` feature is built and rendering
    /// is enabled, plain HTTP page loads otherwise.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let fetch = FetchClient::new(FetchConfig::from(config))?;
        let cache = CacheStore::open(&config.cache_dir).await?;
        let renderer = renderer_for(config, &fetch);
        let discovery = DiscoveryResolver::from_config(fetch.clone(), config)?;
        let pipeline = Pipeline::new(fetch, renderer, config).with_cache(cache);
        Ok(Self::new(discovery, pipeline))
    }

    pub fn discovery(&self) -> &DiscoveryResolver {
        &self.discovery
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Acquire endpoints for a URL or a provider name.
    ///
    /// URL-like input goes straight to the pipeline. Anything else is
    /// resolved to a documentation URL first.
    pub async fn lookup(&self, identifier: &str, force_refresh: bool) -> Result<Lookup, Error> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(Error::InvalidInput("identifier must not be empty".into()));
        }

        if is_url_like(identifier) {
            let result = self.pipeline.acquire(identifier, force_refresh).await?;
            return Ok(Lookup { discovery: None, result });
        }

        let discovery = self.discovery.resolve(identifier, force_refresh).await?;
        tracing::info!("resolved {} to {}", identifier, discovery.docs_url);
        let result = self.pipeline.acquire(&discovery.docs_url, force_refresh).await?;
        Ok(Lookup { discovery: Some(discovery), result })
    }

    /// Close every rendered page and the browser, if one was launched.
    pub async fn shutdown(&self) {
        self.pipeline.renderer().shutdown().await;
    }
}

#[cfg(feature = "render")]
fn renderer_for(config: &AppConfig, fetch: &FetchClient) -> Arc<dyn Renderer> {
    if config.render_enabled {
        Arc::new(crate::render::ChromeRenderer::new())
    } else {
        Arc::new(HttpRenderer::new(fetch.clone()))
    }
}

#[cfg(not(feature = "render"))]
fn renderer_for(config: &AppConfig, fetch: &FetchClient) -> Arc<dyn Renderer> {
    if config.render_enabled {
        tracing::warn!("built without the render feature, loading pages over plain HTTP");
    }
    Arc::new(HttpRenderer::new(fetch.clone()))
}
