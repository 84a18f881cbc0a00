//! The four acquisition strategies, in default order.

use super::{Attempt, Strategy, StrategyContext};
use crate::detect::detect;
use crate::extract::{FrameworkExtractor, LayerContext, LayerOutput, dom, ensure_public, page_title};
use crate::fetch::{ACCEPT_SPEC, FetchClient, origin_of};
use crate::render::{RenderError, RenderOptions, RenderedPage};
use crate::spec::{ParseMode, is_spec_reference, load_document, result_from_document};
use chrono::Utc;
use specscout_core::{ApiInfo, Error, ExtractionResult, Framework};

/// Conventional spec locations, probed in this order.
pub const PROBE_PATHS: &[&str] = &[
    "/openapi.json",
    "/openapi.yaml",
    "/openapi.yml",
    "/swagger.json",
    "/swagger.yaml",
    "/api-docs",
    "/v3/api-docs",
    "/v2/api-docs",
    "/api/openapi.json",
    "/api/swagger.json",
    "/api/v1/openapi.json",
    "/api/v1/swagger.json",
    "/docs/openapi.json",
    "/docs/swagger.json",
    "/swagger/v1/swagger.json",
    "/api-docs.json",
    "/.well-known/openapi.json",
];

/// Fetch the target itself when it names a spec document.
///
/// A non-HTML body that fails to parse or validate is terminal: the caller
/// pointed at a document and that document is broken.
pub struct DirectFetch;

#[async_trait::async_trait]
impl Strategy for DirectFetch {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn attempt(&self, cx: &StrategyContext<'_>) -> Attempt {
        let target = cx.target.as_str();
        if !is_spec_reference(target) {
            return Attempt::Skipped("target is not a spec reference".into());
        }

        let response = match cx.fetch.fetch(target, ACCEPT_SPEC).await {
            Ok(response) => response,
            Err(e) => return Attempt::Failed(e),
        };
        if response.is_html() {
            return Attempt::Failed(Error::SchemaInvalid(format!("{target} served an HTML page")));
        }

        let final_url = response.final_url.to_string();
        match load_document(&response.text(), Some(&final_url), ParseMode::for_url(target)) {
            Ok(doc) => Attempt::Found(result_from_document(&doc, self.name(), &final_url)),
            Err(e) => Attempt::Fatal(Error::SchemaInvalid(format!("{target}: {e}"))),
        }
    }
}

/// Probe the target's origin for conventionally located spec documents.
pub struct PathProbe;

#[async_trait::async_trait]
impl Strategy for PathProbe {
    fn name(&self) -> &'static str {
        "probe"
    }

    async fn attempt(&self, cx: &StrategyContext<'_>) -> Attempt {
        let origin = match origin_of(cx.target) {
            Ok(origin) => origin,
            Err(e) => return Attempt::Failed(Error::InvalidUrl(e.to_string())),
        };

        for path in PROBE_PATHS {
            let Ok(url) = origin.join(path) else { continue };
            let response = match cx.fetch.get(url.as_str(), ACCEPT_SPEC, Some(cx.probe_timeout)).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!("probe {} failed: {}", url, e);
                    continue;
                }
            };
            if !response.status.is_success() || response.is_html() {
                tracing::debug!("probe {} -> {}", url, response.status.as_u16());
                continue;
            }

            let final_url = response.final_url.to_string();
            match load_document(&response.text(), Some(&final_url), ParseMode::Auto) {
                Ok(doc) => return Attempt::Found(result_from_document(&doc, self.name(), &final_url)),
                Err(e) => tracing::debug!("probe {} body rejected: {}", url, e),
            }
        }

        Attempt::Failed(Error::NotFound(format!("no spec at {} conventional paths under {origin}", PROBE_PATHS.len())))
    }
}

fn rendered_result(framework: Framework, strategy: String, output: LayerOutput, page_url: &str, html: &str) -> ExtractionResult {
    let api_info = if output.api_info.title.is_empty() {
        ApiInfo { title: page_title(html), ..output.api_info }
    } else {
        output.api_info
    };
    ExtractionResult {
        framework,
        strategy,
        api_info,
        endpoints: output.endpoints,
        source_url: output.source_url.unwrap_or_else(|| page_url.to_string()),
        extracted_at: Utc::now(),
        spec_type: output.spec_type,
    }
}

async fn open_page(cx: &StrategyContext<'_>, capture_responses: bool) -> Result<Box<dyn RenderedPage>, RenderError> {
    let opts = RenderOptions { capture_responses, ..cx.render_options.clone() };
    cx.renderer.open(cx.target, &opts).await
}

/// Scrape a rendered page with the generic heuristics.
///
/// Runs whatever framework the page carries; a page whose text lists no
/// `METHOD /path` patterns falls through to [`FrameworkScrape`].
pub struct GenericScrape;

impl GenericScrape {
    async fn scrape(&self, page: &dyn RenderedPage) -> Attempt {
        let html = match page.html().await {
            Ok(html) => html,
            Err(e) => return Attempt::Failed(e.into()),
        };
        if let Err(e) = ensure_public(&html, page.url().as_str()) {
            return Attempt::Fatal(e);
        }

        let endpoints = dom::generic_endpoints(&html);
        if endpoints.is_empty() {
            return Attempt::Failed(Error::NotFound(format!("no endpoints found on {}", page.url())));
        }
        let output = LayerOutput::from_endpoints(endpoints, ApiInfo::default());
        Attempt::Found(rendered_result(Framework::Generic, self.name().to_string(), output, page.url().as_str(), &html))
    }
}

#[async_trait::async_trait]
impl Strategy for GenericScrape {
    fn name(&self) -> &'static str {
        "generic"
    }

    async fn attempt(&self, cx: &StrategyContext<'_>) -> Attempt {
        let page = match open_page(cx, false).await {
            Ok(page) => page,
            Err(e) => return Attempt::Failed(e.into()),
        };
        let outcome = self.scrape(page.as_ref()).await;
        page.close().await;
        outcome
    }
}

/// Detect the documentation framework and run its extraction cascade.
pub struct FrameworkScrape;

impl FrameworkScrape {
    async fn scrape(&self, page: &dyn RenderedPage, fetch: &FetchClient) -> Attempt {
        let html = match page.html().await {
            Ok(html) => html,
            Err(e) => return Attempt::Failed(e.into()),
        };
        if let Err(e) = ensure_public(&html, page.url().as_str()) {
            return Attempt::Fatal(e);
        }

        let framework = match detect(page).await {
            Ok(Some(framework)) => framework,
            Ok(None) => {
                return Attempt::Failed(Error::NotFound(format!("no documentation framework detected on {}", page.url())));
            }
            Err(e) => return Attempt::Failed(e),
        };
        let layer_cx = LayerContext { page, framework, fetch, html };

        match FrameworkExtractor::for_framework(framework).extract(&layer_cx).await {
            Ok(Some((output, layer))) => Attempt::Found(rendered_result(
                framework,
                format!("{}/{layer}", self.name()),
                output,
                page.url().as_str(),
                &layer_cx.html,
            )),
            Ok(None) => Attempt::Failed(Error::NotFound(format!(
                "{framework} extraction found no endpoints on {}",
                page.url()
            ))),
            Err(e) => Attempt::Failed(e),
        }
    }
}

#[async_trait::async_trait]
impl Strategy for FrameworkScrape {
    fn name(&self) -> &'static str {
        "framework"
    }

    async fn attempt(&self, cx: &StrategyContext<'_>) -> Attempt {
        let page = match open_page(cx, true).await {
            Ok(page) => page,
            Err(e) => return Attempt::Failed(e.into()),
        };
        let outcome = self.scrape(page.as_ref(), cx.fetch).await;
        page.close().await;
        outcome
    }
}

/// Default strategy order.
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![Box::new(DirectFetch), Box::new(PathProbe), Box::new(GenericScrape), Box::new(FrameworkScrape)]
}
