//! Script-less renderers: static pages and plain HTTP.

use super::{CapturedResponse, RenderError, RenderOptions, RenderedPage, Renderer};
use crate::fetch::{ACCEPT_HTML, FetchClient};
use serde_json::Value;
use specscout_core::Error;
use std::collections::HashMap;
use url::Url;

/// An in-memory page.
///
/// Expressions registered with [`StaticPage::with_evaluation`] answer
/// `evaluate` calls verbatim; anything else evaluates to `None`.
#[derive(Debug, Clone)]
pub struct StaticPage {
    url: Url,
    html: String,
    evaluations: HashMap<String, Value>,
    responses: Vec<CapturedResponse>,
}

impl StaticPage {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self { url, html: html.into(), evaluations: HashMap::new(), responses: Vec::new() }
    }

    pub fn with_evaluation(mut self, expression: impl Into<String>, value: Value) -> Self {
        self.evaluations.insert(expression.into(), value);
        self
    }

    pub fn with_response(mut self, response: CapturedResponse) -> Self {
        self.responses.push(response);
        self
    }
}

#[async_trait::async_trait]
impl RenderedPage for StaticPage {
    fn url(&self) -> &Url {
        &self.url
    }

    fn supports_scripts(&self) -> bool {
        !self.evaluations.is_empty()
    }

    async fn html(&self) -> Result<String, RenderError> {
        Ok(self.html.clone())
    }

    async fn evaluate(&self, expression: &str) -> Result<Option<Value>, RenderError> {
        Ok(self.evaluations.get(expression).filter(|v| !v.is_null()).cloned())
    }

    async fn captured_responses(&self) -> Vec<CapturedResponse> {
        self.responses.clone()
    }

    async fn close(self: Box<Self>) {}
}

/// Serves pre-loaded pages keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct StaticRenderer {
    pages: HashMap<String, StaticPage>,
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: StaticPage) -> Self {
        self.pages.insert(page.url.to_string(), page);
        self
    }
}

#[async_trait::async_trait]
impl Renderer for StaticRenderer {
    async fn open(&self, url: &Url, _opts: &RenderOptions) -> Result<Box<dyn RenderedPage>, RenderError> {
        self.pages
            .get(url.as_str())
            .cloned()
            .map(|p| Box::new(p) as Box<dyn RenderedPage>)
            .ok_or_else(|| RenderError::Navigation(format!("no static page for {url}")))
    }

    async fn shutdown(&self) {}

    fn open_pages(&self) -> usize {
        0
    }
}

/// Fetches pages over HTTP without running their scripts.
///
/// Used when headless rendering is disabled: extractors still get the
/// served markup and inline scripts, but no live state or traffic.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    fetch: FetchClient,
}

impl HttpRenderer {
    pub fn new(fetch: FetchClient) -> Self {
        Self { fetch }
    }
}

#[async_trait::async_trait]
impl Renderer for HttpRenderer {
    async fn open(&self, url: &Url, opts: &RenderOptions) -> Result<Box<dyn RenderedPage>, RenderError> {
        let response = self
            .fetch
            .get(url.as_str(), ACCEPT_HTML, Some(opts.timeout))
            .await
            .map_err(|e| match e {
                Error::Timeout(_) => RenderError::Timeout(opts.timeout.as_millis() as u64),
                other => RenderError::Navigation(other.to_string()),
            })?;

        if !response.status.is_success() {
            return Err(RenderError::Navigation(format!("{url} returned status {}", response.status.as_u16())));
        }

        tracing::debug!("loaded {} over HTTP ({} bytes)", response.final_url, response.bytes.len());
        Ok(Box::new(StaticPage::new(response.final_url.clone(), response.text())))
    }

    async fn shutdown(&self) {}

    fn open_pages(&self) -> usize {
        0
    }
}
