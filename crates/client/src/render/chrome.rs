//! Headless Chrome/Chromium renderer using chromiumoxide.
//!
//! The browser is launched on the first `open` and owned by the renderer.
//! Every page is registered until its handle is closed; `shutdown` closes
//! whatever is left and then the browser itself.

use super::{CapturedResponse, RenderError, RenderOptions, RenderedPage, Renderer};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use url::Url;

const DEFAULT_ARGS: &[&str] = &["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage", "--disable-extensions"];

/// Whether a response is worth keeping: JSON/YAML by type or extension.
pub(crate) fn is_document_like(url: &str, mime_type: &str) -> bool {
    let mime = mime_type.to_ascii_lowercase();
    if mime.contains("json") || mime.contains("yaml") {
        return true;
    }
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    [".json", ".yaml", ".yml"].iter().any(|ext| path.ends_with(ext))
}

/// Poll the browser's event stream until the connection ends.
///
/// Event errors are logged and skipped; the stream only ends when the
/// browser goes away. Returns the number of errors seen.
async fn drive_events<S, E>(events: &mut S) -> usize
where
    S: futures_util::Stream<Item = Result<(), E>> + Unpin,
    E: std::fmt::Display,
{
    let mut errors = 0;
    while let Some(event) = events.next().await {
        if let Err(e) = event {
            errors += 1;
            tracing::debug!("browser handler event error: {e}");
        }
    }
    errors
}

#[derive(Default)]
struct PageRegistry {
    next_id: AtomicU64,
    pages: Mutex<HashMap<u64, Page>>,
}

impl PageRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Page>> {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, page: Page) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, page);
        id
    }

    fn remove(&self, id: u64) -> Option<Page> {
        self.lock().remove(&id)
    }

    fn drain(&self) -> Vec<Page> {
        self.lock().drain().map(|(_, page)| page).collect()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

struct BrowserHandle {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Headless Chrome/Chromium renderer.
pub struct ChromeRenderer {
    args: Vec<String>,
    browser: tokio::sync::Mutex<Option<BrowserHandle>>,
    registry: Arc<PageRegistry>,
}

impl Default for ChromeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChromeRenderer {
    /// A renderer that has not launched its browser yet.
    pub fn new() -> Self {
        Self {
            args: DEFAULT_ARGS.iter().map(|a| a.to_string()).collect(),
            browser: tokio::sync::Mutex::new(None),
            registry: Arc::new(PageRegistry::default()),
        }
    }

    /// Replace the extra command-line arguments passed to the browser.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    async fn launch(&self) -> Result<BrowserHandle, RenderError> {
        let mut builder = BrowserConfig::builder();
        for arg in &self.args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder.build().map_err(RenderError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            let errors = drive_events(&mut handler).await;
            tracing::warn!("browser connection closed after {errors} handler errors");
        });

        tracing::info!("launched headless browser");
        Ok(BrowserHandle { browser, handler })
    }

    async fn new_page(&self) -> Result<Page, RenderError> {
        let mut guard = self.browser.lock().await;
        if let Some(handle) = guard.as_ref()
            && handle.handler.is_finished()
        {
            tracing::warn!("browser handler exited, relaunching");
            *guard = None;
        }
        if guard.is_none() {
            *guard = Some(self.launch().await?);
        }
        let handle = guard.as_ref().ok_or(RenderError::BrowserClosed)?;
        handle
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))
    }
}

#[derive(Debug, Clone)]
struct PendingResponse {
    request_id: RequestId,
    url: String,
    status: u16,
    mime_type: String,
}

/// A page opened by [`ChromeRenderer`].
pub struct ChromePage {
    id: u64,
    page: Page,
    url: Url,
    registry: Arc<PageRegistry>,
    pending: Arc<Mutex<Vec<PendingResponse>>>,
    capture_task: Option<JoinHandle<()>>,
}

impl ChromePage {
    async fn start_capture(&mut self) -> Result<(), RenderError> {
        self.page
            .execute(EnableParams::default())
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;
        let mut events = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        let pending = Arc::clone(&self.pending);
        self.capture_task = Some(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let response = &event.response;
                if !is_document_like(&response.url, &response.mime_type) {
                    continue;
                }
                pending.lock().unwrap_or_else(PoisonError::into_inner).push(PendingResponse {
                    request_id: event.request_id.clone(),
                    url: response.url.clone(),
                    status: u16::try_from(response.status).unwrap_or_default(),
                    mime_type: response.mime_type.clone(),
                });
            }
        }));
        Ok(())
    }

    async fn navigate(&mut self, url: &Url, opts: &RenderOptions) -> Result<(), RenderError> {
        let load = async {
            self.page
                .goto(url.as_str())
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            Ok::<(), RenderError>(())
        };
        tokio::time::timeout(opts.timeout, load)
            .await
            .map_err(|_| RenderError::Timeout(opts.timeout.as_millis() as u64))??;

        tokio::time::sleep(opts.settle).await;

        if let Ok(Some(current)) = self.page.url().await
            && let Ok(parsed) = Url::parse(&current)
        {
            self.url = parsed;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RenderedPage for ChromePage {
    fn url(&self) -> &Url {
        &self.url
    }

    fn supports_scripts(&self) -> bool {
        true
    }

    async fn html(&self) -> Result<String, RenderError> {
        self.page
            .content()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))
    }

    async fn evaluate(&self, expression: &str) -> Result<Option<Value>, RenderError> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| RenderError::Evaluation(e.to_string()))?;
        Ok(result.into_value::<Value>().ok().filter(|v| !v.is_null()))
    }

    async fn captured_responses(&self) -> Vec<CapturedResponse> {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let mut captured = Vec::with_capacity(pending.len());
        for response in pending {
            match self.page.execute(GetResponseBodyParams::new(response.request_id.clone())).await {
                Ok(body) if body.result.base64_encoded => {
                    tracing::debug!("skipping binary response body from {}", response.url);
                }
                Ok(body) => captured.push(CapturedResponse {
                    url: response.url,
                    status: response.status,
                    content_type: Some(response.mime_type),
                    body: body.result.body.clone(),
                }),
                Err(e) => tracing::debug!("response body for {} unavailable: {e}", response.url),
            }
        }
        captured
    }

    async fn close(self: Box<Self>) {
        if let Some(task) = &self.capture_task {
            task.abort();
        }
        if let Some(page) = self.registry.remove(self.id)
            && let Err(e) = page.close().await
        {
            tracing::debug!("failed to close page {}: {e}", self.url);
        }
    }
}

#[async_trait::async_trait]
impl Renderer for ChromeRenderer {
    async fn open(&self, url: &Url, opts: &RenderOptions) -> Result<Box<dyn RenderedPage>, RenderError> {
        let page = self.new_page().await?;
        let id = self.registry.register(page.clone());

        let mut chrome_page = Box::new(ChromePage {
            id,
            page,
            url: url.clone(),
            registry: Arc::clone(&self.registry),
            pending: Arc::new(Mutex::new(Vec::new())),
            capture_task: None,
        });

        let prepared = if opts.capture_responses { chrome_page.start_capture().await } else { Ok(()) };
        let loaded = match prepared {
            Ok(()) => chrome_page.navigate(url, opts).await,
            Err(e) => Err(e),
        };

        match loaded {
            Ok(()) => {
                tracing::debug!("rendered {}", chrome_page.url);
                Ok(chrome_page)
            }
            Err(e) => {
                chrome_page.close().await;
                Err(e)
            }
        }
    }

    async fn shutdown(&self) {
        let pages = self.registry.drain();
        if !pages.is_empty() {
            tracing::debug!("closing {} open pages", pages.len());
        }
        for page in pages {
            if let Err(e) = page.close().await {
                tracing::debug!("failed to close page during shutdown: {e}");
            }
        }

        if let Some(mut handle) = self.browser.lock().await.take() {
            if let Err(e) = handle.browser.close().await {
                tracing::debug!("browser close failed: {e}");
            }
            if let Err(e) = handle.browser.wait().await {
                tracing::debug!("browser wait failed: {e}");
            }
            handle.handler.abort();
            tracing::info!("headless browser shut down");
        }
    }

    fn open_pages(&self) -> usize {
        self.registry.len()
    }
}
