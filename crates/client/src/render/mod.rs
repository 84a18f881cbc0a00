//! Page rendering for documentation sites.
//!
//! A [`Renderer`] opens pages and hands back [`RenderedPage`] handles that
//! the extractors query for markup, in-page state, and network responses
//! captured during load. Implementations:
//!
//! - [`ChromeRenderer`] (feature `render`): one lazily launched headless
//!   browser, every open page tracked until closed or shut down
//! - [`HttpRenderer`]: static HTML over HTTP, no script evaluation
//! - [`StaticRenderer`]: pre-loaded pages keyed by URL

#[cfg(feature = "render")]
pub mod chrome;
pub mod page;

#[cfg(feature = "render")]
pub use chrome::ChromeRenderer;
pub use page::{HttpRenderer, StaticPage, StaticRenderer};

use serde_json::Value;
use specscout_core::{AppConfig, Error};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during page rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Failed to get page content.
    #[error("content retrieval failed: {0}")]
    ContentRetrieval(String),

    /// Script evaluation failed at the protocol level.
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// Timeout waiting for page to load.
    #[error("render timeout after {0}ms")]
    Timeout(u64),

    /// Browser closed unexpectedly.
    #[error("browser closed unexpectedly")]
    BrowserClosed,
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Timeout(_) => Error::Timeout(err.to_string()),
            other => Error::RenderFailed(other.to_string()),
        }
    }
}

/// Options for opening a page.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Navigation timeout (default: 30s).
    pub timeout: Duration,

    /// Time given to client-side scripts after load (default: 1.5s).
    pub settle: Duration,

    /// Record network responses made while the page loads.
    pub capture_responses: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { timeout: Duration::from_millis(30000), settle: Duration::from_millis(1500), capture_responses: false }
    }
}

impl From<&AppConfig> for RenderOptions {
    fn from(config: &AppConfig) -> Self {
        Self { timeout: config.render_timeout(), ..Default::default() }
    }
}

/// A network response observed while a page loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Handle to an open page.
#[async_trait::async_trait]
pub trait RenderedPage: Send + Sync {
    /// URL the page ended up on.
    fn url(&self) -> &Url;

    /// Whether `evaluate` can run scripts on this page.
    fn supports_scripts(&self) -> bool;

    /// Current serialized DOM.
    async fn html(&self) -> Result<String, RenderError>;

    /// Evaluate an expression in the page; `None` when it yields nothing
    /// serializable or scripts are unsupported.
    async fn evaluate(&self, expression: &str) -> Result<Option<Value>, RenderError>;

    /// Responses recorded during load (empty unless capture was requested).
    async fn captured_responses(&self) -> Vec<CapturedResponse>;

    /// Close the page and release its resources.
    async fn close(self: Box<Self>);
}

/// Renderer trait for opening documentation pages.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    /// Open a URL and wait for it to load.
    async fn open(&self, url: &Url, opts: &RenderOptions) -> Result<Box<dyn RenderedPage>, RenderError>;

    /// Close every page still open and release the browser, if any.
    async fn shutdown(&self);

    /// Number of pages currently open.
    fn open_pages(&self) -> usize;
}
