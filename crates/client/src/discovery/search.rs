//! Client for the provider search surface.
//!
//! The surface is an HTML directory with two entry points:
//! - provider pages at `<base>/a/<slug>`
//! - free-text search at `<base>/search?q=<query>`, listing providers as
//!   `/a/<slug>` links
//!
//! Requests are spaced by a minimum interval. Markup that does not match
//! yields no candidates rather than an error.

use crate::discovery::score::Candidate;
use crate::fetch::{ACCEPT_HTML, FetchClient, FetchResponse};
use scraper::{ElementRef, Html, Selector};
use specscout_core::Error;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

/// Maximum accepted query length in characters.
pub const MAX_QUERY_LEN: usize = 400;

static PROVIDER_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/a/"]"#).expect("invalid selector"));

static NOT_FOUND_MARKERS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title, h1").expect("invalid selector"));

/// Rate limiter to enforce request intervals.
#[derive(Debug)]
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self { last_request: Mutex::new(None), min_interval }
    }

    /// Wait until `min_interval` has passed since the previous request.
    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// A fetched provider page on the search surface.
#[derive(Debug, Clone)]
pub struct ProviderPage {
    pub slug: String,
    pub url: Url,
    pub html: String,
}

/// Reject empty or oversized queries.
pub fn validate_query(query: &str) -> Result<(), Error> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::InvalidInput("query cannot be empty".to_string()));
    }
    if query.chars().count() > MAX_QUERY_LEN {
        return Err(Error::InvalidInput(format!(
            "query too long: {} chars (max {MAX_QUERY_LEN})",
            query.chars().count()
        )));
    }
    Ok(())
}

/// Search-surface client.
#[derive(Debug, Clone)]
pub struct SearchClient {
    fetch: FetchClient,
    base_url: Url,
    rate_limiter: Arc<RateLimiter>,
}

impl SearchClient {
    pub fn new(fetch: FetchClient, base_url: &str, min_interval: Duration) -> Result<Self, Error> {
        let base_url = Url::parse(base_url).map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self { fetch, base_url, rate_limiter: Arc::new(RateLimiter::new(min_interval)) })
    }

    /// Host of the search surface, used to exclude its own links.
    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    async fn get(&self, url: &Url) -> Result<FetchResponse, Error> {
        self.rate_limiter.acquire().await;
        self.fetch
            .get(url.as_str(), ACCEPT_HTML, None)
            .await
            .map_err(|e| Error::SearchError(format!("{url}: {e}")))
    }

    /// Fetch `<base>/a/<slug>`; `None` unless it is a genuine provider page.
    pub async fn provider_page(&self, slug: &str) -> Result<Option<ProviderPage>, Error> {
        if slug.is_empty() {
            return Ok(None);
        }
        let url = self.endpoint(&format!("/a/{slug}"))?;
        tracing::debug!("trying direct provider page {}", url);

        let response = self.get(&url).await?;
        if !response.status.is_success() {
            tracing::debug!("direct provider page returned {}", response.status.as_u16());
            return Ok(None);
        }
        if !response.is_html() {
            return Ok(None);
        }

        let html = response.text();
        if is_not_found_page(&html) {
            tracing::debug!("direct provider page is a not-found page");
            return Ok(None);
        }

        Ok(Some(ProviderPage { slug: slug.to_string(), url: response.final_url, html }))
    }

    /// Run a free-text search and return the listed providers in page order.
    pub async fn search(&self, query: &str) -> Result<Vec<Candidate>, Error> {
        validate_query(query)?;
        let mut url = self.endpoint("/search")?;
        url.query_pairs_mut().append_pair("q", query.trim());

        tracing::debug!("searching providers: query={}", query);
        let response = self.get(&url).await?;
        if !response.status.is_success() {
            return Err(Error::SearchError(format!("{url} returned status {}", response.status.as_u16())));
        }

        let candidates = parse_candidates(&response.text());
        tracing::debug!("search returned {} candidates", candidates.len());
        Ok(candidates)
    }
}

/// Slug named by a provider href (`/a/<slug>` or `https://host/a/<slug>`).
fn slug_from_href(href: &str) -> Option<String> {
    let path = href.split_once("://").map_or(href, |(_, rest)| rest.find('/').map_or("", |i| &rest[i..]));
    let rest = path.strip_prefix("/a/")?;
    let slug = rest.split(['/', '?', '#']).next()?;
    (!slug.is_empty()).then(|| slug.to_string())
}

fn collapse(text: impl Iterator<Item = impl AsRef<str>>) -> String {
    let joined: Vec<String> = text.map(|t| t.as_ref().to_string()).collect();
    joined.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn context_of(element: &ElementRef<'_>) -> String {
    element
        .parent()
        .and_then(ElementRef::wrap)
        .map(|parent| collapse(parent.text()))
        .unwrap_or_default()
}

/// Parse provider candidates out of a search results page.
pub fn parse_candidates(html: &str) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for element in document.select(&PROVIDER_LINKS) {
        let Some(slug) = element.value().attr("href").and_then(slug_from_href) else { continue };
        if !seen.insert(slug.clone()) {
            continue;
        }
        candidates.push(Candidate { slug, name: collapse(element.text()), context: context_of(&element) });
    }
    candidates
}

/// Whether a page's title or heading announces a missing page.
pub fn is_not_found_page(html: &str) -> bool {
    let document = Html::parse_document(html);
    document.select(&NOT_FOUND_MARKERS).any(|el| {
        let text = collapse(el.text()).to_lowercase();
        text.contains("not found") || text.contains("404") || text.contains("no results")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> SearchClient {
        SearchClient::new(FetchClient::new(FetchConfig::default()).unwrap(), base, Duration::ZERO).unwrap()
    }

    #[test]
    fn test_validate_query() {
        assert!(validate_query("stripe").is_ok());
        assert!(matches!(validate_query("   "), Err(Error::InvalidInput(_))));
        assert!(matches!(validate_query(&"a".repeat(401)), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_parse_candidates() {
        let html = r#"
            <ul>
              <li><a href="/a/stripe">Stripe</a> Online payments</li>
              <li><a href="https://apitracker.io/a/stripe-connect?ref=s">Stripe Connect</a> Marketplaces</li>
              <li><a href="/a/stripe">Stripe again</a></li>
              <li><a href="/about">About</a></li>
            </ul>
        "#;
        let candidates = parse_candidates(html);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].slug, "stripe");
        assert_eq!(candidates[0].name, "Stripe");
        assert_eq!(candidates[0].context, "Stripe Online payments");
        assert_eq!(candidates[1].slug, "stripe-connect");
    }

    #[test]
    fn test_parse_candidates_unexpected_markup() {
        assert!(parse_candidates("<div>nothing useful</div>").is_empty());
        assert!(parse_candidates("").is_empty());
    }

    #[test]
    fn test_not_found_page() {
        assert!(is_not_found_page("<html><head><title>Page not found</title></head></html>"));
        assert!(is_not_found_page("<h1>404</h1>"));
        assert!(!is_not_found_page("<title>Stripe API</title><h1>Stripe</h1>"));
    }

    #[tokio::test]
    async fn test_provider_page_variants() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a/stripe"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html><title>Stripe</title></html>", "text/html"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/a/ghost"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html><h1>Not Found</h1></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let page = client.provider_page("stripe").await.unwrap().unwrap();
        assert_eq!(page.slug, "stripe");
        assert!(page.html.contains("Stripe"));

        assert!(client.provider_page("ghost").await.unwrap().is_none());
        assert!(client.provider_page("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_sends_query_and_maps_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "stripe"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"<a href="/a/stripe">Stripe</a>"#, "text/html"))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let candidates = client.search("stripe").await.unwrap();
        assert_eq!(candidates[0].slug, "stripe");

        let failing = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&failing)
            .await;
        let err = self::client(&failing.uri()).search("stripe").await.unwrap_err();
        assert!(matches!(err, Error::SearchError(_)));
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
