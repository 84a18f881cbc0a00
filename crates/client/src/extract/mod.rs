//! Endpoint extraction from rendered documentation pages.
//!
//! ### Layered cascade
//!
//! Each framework gets an ordered list of [`ExtractionLayer`]s; the cascade
//! advances only when a layer yields zero endpoints:
//!
//! 1. `state`: the spec held by the live application
//! 2. `network`: spec responses captured while the page loaded
//! 3. `scripts`: inline spec literals or spec URL declarations
//! 4. `dom`: operation blocks, sidebar entries, page text
//!
//! Generic pages only run the `generic` DOM heuristics. Every layer emits
//! [`NormalizedEndpoint`]s deduplicated by `(method, path)`.

pub mod auth;
pub mod dom;
pub mod network;
pub mod scripts;
pub mod state;

pub use auth::{auth_wall_reason, ensure_public};
pub use dom::{DomLayer, GenericLayer, dedupe, endpoints_in_text, page_title};
pub use network::NetworkLayer;
pub use scripts::ScriptLayer;
pub use state::StateLayer;

use crate::fetch::FetchClient;
use crate::render::RenderedPage;
use crate::spec::{api_info, endpoints_from_document};
use specscout_core::{ApiInfo, Error, Framework, NormalizedEndpoint, SpecDocument, SpecType};

/// What one layer found.
#[derive(Debug, Clone, Default)]
pub struct LayerOutput {
    pub endpoints: Vec<NormalizedEndpoint>,
    pub api_info: ApiInfo,
    /// Set when a real document backed the endpoints.
    pub spec_type: Option<SpecType>,
    /// Where the document came from, when not the page itself.
    pub source_url: Option<String>,
}

impl LayerOutput {
    pub fn from_document(doc: &SpecDocument, source_url: Option<String>) -> Self {
        Self {
            endpoints: endpoints_from_document(doc),
            api_info: api_info(doc),
            spec_type: Some(doc.spec_type),
            source_url,
        }
    }

    pub fn from_endpoints(endpoints: Vec<NormalizedEndpoint>, api_info: ApiInfo) -> Self {
        Self { endpoints, api_info, spec_type: None, source_url: None }
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Inputs shared by every layer for one page.
pub struct LayerContext<'a> {
    pub page: &'a dyn RenderedPage,
    pub framework: Framework,
    pub fetch: &'a FetchClient,
    /// Page markup, read once before the cascade starts.
    pub html: String,
}

impl<'a> LayerContext<'a> {
    pub async fn new(page: &'a dyn RenderedPage, framework: Framework, fetch: &'a FetchClient) -> Result<Self, Error> {
        let html = page.html().await?;
        Ok(Self { page, framework, fetch, html })
    }
}

/// One step of a framework's extraction cascade.
#[async_trait::async_trait]
pub trait ExtractionLayer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extract endpoints; an empty output passes control to the next layer.
    async fn extract(&self, cx: &LayerContext<'_>) -> Result<LayerOutput, Error>;
}

/// Ordered extraction layers for one framework.
pub struct FrameworkExtractor {
    framework: Framework,
    layers: Vec<Box<dyn ExtractionLayer>>,
}

impl FrameworkExtractor {
    /// Standard cascade for a detected framework.
    pub fn for_framework(framework: Framework) -> Self {
        let layers: Vec<Box<dyn ExtractionLayer>> = match framework {
            Framework::Generic => vec![Box::new(GenericLayer)],
            _ => vec![Box::new(StateLayer), Box::new(NetworkLayer), Box::new(ScriptLayer), Box::new(DomLayer)],
        };
        Self { framework, layers }
    }

    /// Cascade with a custom layer list.
    pub fn with_layers(framework: Framework, layers: Vec<Box<dyn ExtractionLayer>>) -> Self {
        Self { framework, layers }
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }

    /// Run layers in order until one yields endpoints.
    ///
    /// Returns the output and the producing layer's name, or `None` when
    /// every layer came up empty. Terminal errors stop the cascade; all
    /// others are logged and skipped.
    pub async fn extract(&self, cx: &LayerContext<'_>) -> Result<Option<(LayerOutput, &'static str)>, Error> {
        for layer in &self.layers {
            match layer.extract(cx).await {
                Ok(mut output) if !output.is_empty() => {
                    output.endpoints = dedupe(output.endpoints);
                    tracing::debug!(
                        "{} layer found {} endpoints on {}",
                        layer.name(),
                        output.endpoints.len(),
                        cx.page.url()
                    );
                    return Ok(Some((output, layer.name())));
                }
                Ok(_) => tracing::debug!("{} layer found nothing on {}", layer.name(), cx.page.url()),
                Err(e) if e.is_terminal() => return Err(e),
                Err(e) => tracing::debug!("{} layer failed on {}: {}", layer.name(), cx.page.url(), e),
            }
        }
        Ok(None)
    }
}
