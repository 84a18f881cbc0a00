//! Provider name → documentation URL resolution.
//!
//! ### Resolution order
//!
//! 1. Discovery cache (skipped on force-refresh)
//! 2. Direct provider page `<base>/a/<slug>`; a genuine page short-circuits
//!    the free-text search
//! 3. Free-text search, best-scoring candidate's page
//!
//! On each provider page the docs-link cascade in [`links`] picks the URL.
//! Fresh resolutions are written back to the discovery cache.

pub mod links;
pub mod score;
pub mod search;

pub use links::{Link, extract_links, find_docs_url};
pub use score::{Candidate, best_candidate, slugify};
pub use search::{ProviderPage, SearchClient, validate_query};

use crate::fetch::FetchClient;
use serde::Serialize;
use specscout_core::{AppConfig, DiscoveryCache, Error};

/// A resolved provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discovery {
    pub provider_id: String,
    pub docs_url: String,
    /// Provider page the docs link was taken from.
    pub source_origin: String,
    /// Whether the answer came from the discovery cache.
    pub cached: bool,
}

/// Resolves provider names to documentation URLs.
#[derive(Debug, Clone)]
pub struct DiscoveryResolver {
    search: SearchClient,
    cache: Option<DiscoveryCache>,
}

impl DiscoveryResolver {
    pub fn new(search: SearchClient, cache: Option<DiscoveryCache>) -> Self {
        Self { search, cache }
    }

    /// Resolver wired from application config, caching under `cache_dir`.
    pub fn from_config(fetch: FetchClient, config: &AppConfig) -> Result<Self, Error> {
        let search = SearchClient::new(fetch, &config.search_base_url, config.search_min_interval())?;
        Ok(Self::new(search, Some(DiscoveryCache::new(&config.cache_dir))))
    }

    pub fn cache(&self) -> Option<&DiscoveryCache> {
        self.cache.as_ref()
    }

    /// Resolve a provider name to its documentation URL.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for empty or oversized queries
    /// - `ProviderNotFound` when no candidate matches
    /// - `DocsUrlNotFound` when the provider page has no usable link
    /// - `SearchError` when the search surface is unreachable or erroring
    pub async fn resolve(&self, query: &str, force_refresh: bool) -> Result<Discovery, Error> {
        validate_query(query)?;
        let query = query.trim();

        if !force_refresh
            && let Some(cache) = &self.cache
        {
            match cache.get(query).await {
                Ok(entry) => {
                    tracing::debug!("discovery cache hit for {}", query);
                    return Ok(Discovery {
                        provider_id: entry.provider_key,
                        docs_url: entry.docs_url,
                        source_origin: entry.source_origin,
                        cached: true,
                    });
                }
                Err(Error::NotFound(_) | Error::Expired(_)) => {}
                Err(e) => tracing::warn!("discovery cache read failed: {}", e),
            }
        }

        let slug = slugify(query);
        if let Some(page) = self.search.provider_page(&slug).await? {
            tracing::debug!("direct provider page hit for {}", slug);
            return self.finish(query, &page).await;
        }

        let candidates = self.search.search(query).await?;
        let Some((best, score)) = best_candidate(query, &candidates) else {
            return Err(Error::ProviderNotFound(query.to_string()));
        };
        tracing::debug!("best search candidate for {}: {} (score {})", query, best.slug, score);

        let page = self
            .search
            .provider_page(&best.slug)
            .await?
            .ok_or_else(|| Error::DocsUrlNotFound(format!("provider page for {} is unavailable", best.slug)))?;
        self.finish(query, &page).await
    }

    async fn finish(&self, query: &str, page: &ProviderPage) -> Result<Discovery, Error> {
        let docs_url = find_docs_url(&page.html, &page.url, self.search.host())
            .ok_or_else(|| Error::DocsUrlNotFound(format!("no documentation link on {}", page.url)))?;

        let discovery = Discovery {
            provider_id: page.slug.clone(),
            docs_url: docs_url.to_string(),
            source_origin: page.url.to_string(),
            cached: false,
        };
        tracing::info!("resolved {} to {}", query, discovery.docs_url);

        if let Some(cache) = &self.cache
            && let Err(e) = cache.put(query, &discovery.docs_url, &discovery.source_origin).await
        {
            tracing::warn!("failed to cache discovery for {}: {}", query, e);
        }
        Ok(discovery)
    }
}
