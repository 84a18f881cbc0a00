//! Link harvesting and the docs-link cascade for provider pages.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// A harvested link with its visible text and resolved href.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Link text content, plus `title`/`aria-label` when present.
    pub text: String,
    /// Resolved href URL
    pub href: Url,
}

/// Hosts that never count as a provider's documentation.
const EXCLUDED_DOMAINS: &[&str] = &[
    "twitter.com",
    "x.com",
    "github.com",
    "gitlab.com",
    "bitbucket.org",
    "linkedin.com",
    "facebook.com",
    "instagram.com",
    "youtube.com",
    "medium.com",
    "reddit.com",
    "discord.gg",
    "discord.com",
    "t.me",
    "crunchbase.com",
    "producthunt.com",
    "stackoverflow.com",
    "npmjs.com",
    "pypi.org",
];

const DOCS_KEYWORDS: &[&str] = &[
    "api reference",
    "api docs",
    "api documentation",
    "documentation",
    "openapi",
    "swagger",
    "developer",
];

static DOCS_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^/(docs?|documentation|developers?|dev|api-reference|api-docs|reference|apis?)(/|$)")
        .expect("invalid docs path pattern")
});

static DOCS_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(docs|developers?|dev|api|apidocs)\.").expect("invalid docs host pattern"));

static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector"));

/// Extract links from an HTML document, resolving relative URLs against the base URL.
///
/// Non-http(s) targets are dropped, duplicates (by href) keep the first
/// occurrence.
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Link> {
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&ANCHORS) {
        let Some(href) = element.value().attr("href") else { continue };
        let Ok(resolved) = base_url.join(href.trim()) else { continue };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }

        if !seen.insert(resolved.to_string()) {
            continue;
        }

        let mut text = element.text().collect::<Vec<_>>().join(" ");
        for attr in ["title", "aria-label"] {
            if let Some(extra) = element.value().attr(attr) {
                text.push(' ');
                text.push_str(extra);
            }
        }
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

        links.push(Link { text, href: resolved });
    }

    links
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Whether a link points somewhere other than the search surface and the
/// excluded social/code-hosting domains.
fn is_candidate(link: &Link, search_host: &str) -> bool {
    let Some(host) = link.href.host_str() else { return false };
    let host = host.trim_start_matches("www.");
    let search_host = search_host.trim_start_matches("www.");
    if host_matches(host, search_host) {
        return false;
    }
    !EXCLUDED_DOMAINS.iter().any(|d| host_matches(host, d))
}

/// Pick the most likely documentation URL among a provider page's links.
///
/// Cascade, first hit wins:
/// 1. an explicit "developer portal" link
/// 2. link text naming docs (api reference, documentation, swagger, ...)
/// 3. an href on a conventional docs path or docs subdomain
/// 4. any remaining link whose path mentions `api`, then `docs`/`developer`
///
/// Search-host and excluded-domain links are dropped before stage 1, not
/// only for the fallback: the search surface's own navigation carries
/// "API docs" style links that would otherwise win stage 2.
pub fn find_docs_url(html: &str, page_url: &Url, search_host: &str) -> Option<Url> {
    let links: Vec<Link> = extract_links(html, page_url)
        .into_iter()
        .filter(|l| is_candidate(l, search_host))
        .collect();

    let lower_text = |l: &Link| l.text.to_lowercase();

    let portal = links
        .iter()
        .find(|l| lower_text(l).contains("developer portal"));
    if let Some(link) = portal {
        tracing::debug!("docs link via developer portal text: {}", link.href);
        return Some(link.href.clone());
    }

    let by_text = links.iter().find(|l| {
        let text = lower_text(l);
        DOCS_KEYWORDS.iter().any(|kw| text.contains(kw))
    });
    if let Some(link) = by_text {
        tracing::debug!("docs link via link text: {}", link.href);
        return Some(link.href.clone());
    }

    let by_path = links.iter().find(|l| {
        DOCS_PATH.is_match(l.href.path()) || l.href.host_str().is_some_and(|h| DOCS_HOST.is_match(h))
    });
    if let Some(link) = by_path {
        tracing::debug!("docs link via docs path: {}", link.href);
        return Some(link.href.clone());
    }

    let path_of = |l: &Link| l.href.path().to_lowercase();
    links
        .iter()
        .find(|l| path_of(l).contains("api"))
        .or_else(|| {
            links.iter().find(|l| {
                let path = path_of(l);
                path.contains("docs") || path.contains("developer")
            })
        })
        .map(|l| l.href.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://apitracker.io/a/stripe").unwrap()
    }

    #[test]
    fn test_extract_links_relative_and_duplicate() {
        let html = r#"
            <a href="/about">About</a>
            <a href="contact">Contact</a>
            <a href="/about">Again</a>
            <a href="mailto:hi@example.com">Mail</a>
        "#;
        let links = extract_links(html, &Url::parse("https://example.com/path/").unwrap());
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "About");
        assert_eq!(links[0].href.as_str(), "https://example.com/about");
        assert_eq!(links[1].href.as_str(), "https://example.com/path/contact");
    }

    #[test]
    fn test_extract_links_collapses_whitespace_and_reads_title() {
        let html = r#"<a href="https://x.dev" title="Docs">
                Line 1
                Line 2
            </a>"#;
        let links = extract_links(html, &base());
        assert_eq!(links[0].text, "Line 1 Line 2 Docs");
    }

    #[test]
    fn test_developer_portal_wins() {
        let html = r#"
            <a href="https://stripe.com/docs">Documentation</a>
            <a href="https://dev.stripe.com">Developer Portal</a>
        "#;
        let url = find_docs_url(html, &base(), "apitracker.io").unwrap();
        assert_eq!(url.as_str(), "https://dev.stripe.com/");
    }

    #[test]
    fn test_keyword_text_before_path() {
        let html = r#"
            <a href="https://stripe.com/docs/overview">Overview</a>
            <a href="https://stripe.com/reference">API Reference</a>
        "#;
        let url = find_docs_url(html, &base(), "apitracker.io").unwrap();
        assert_eq!(url.as_str(), "https://stripe.com/reference");
    }

    #[test]
    fn test_docs_path_and_subdomain() {
        let html = r#"
            <a href="https://stripe.com/pricing">Pricing</a>
            <a href="https://stripe.com/docs">Read more</a>
        "#;
        let url = find_docs_url(html, &base(), "apitracker.io").unwrap();
        assert_eq!(url.as_str(), "https://stripe.com/docs");

        let html = r#"<a href="https://docs.acme.io/start">Start</a>"#;
        let url = find_docs_url(html, &base(), "apitracker.io").unwrap();
        assert_eq!(url.host_str(), Some("docs.acme.io"));
    }

    #[test]
    fn test_excludes_search_host_and_social() {
        let html = r#"
            <a href="/docs">Tracker Docs</a>
            <a href="https://github.com/stripe/openapi">OpenAPI on GitHub</a>
            <a href="https://twitter.com/stripe">Developer news</a>
        "#;
        assert!(find_docs_url(html, &base(), "apitracker.io").is_none());
    }

    #[test]
    fn test_search_host_navigation_never_wins() {
        let html = r#"
            <nav><a href="/api-documentation">API Documentation</a></nav>
            <a href="https://github.com/stripe">Developer SDKs</a>
            <a href="https://stripe.com/docs/api">Stripe</a>
        "#;
        let url = find_docs_url(html, &base(), "apitracker.io").unwrap();
        assert_eq!(url.as_str(), "https://stripe.com/docs/api");
    }

    #[test]
    fn test_fallback_api_then_docs() {
        let html = r#"
            <a href="https://acme.io/company">Company</a>
            <a href="https://acme.io/help/docs-center">Help</a>
            <a href="https://acme.io/platform/apis-overview">Platform</a>
        "#;
        let url = find_docs_url(html, &base(), "apitracker.io").unwrap();
        assert_eq!(url.path(), "/platform/apis-overview");

        let html = r#"<a href="https://acme.io/help/docs-center">Help</a>"#;
        let url = find_docs_url(html, &base(), "apitracker.io").unwrap();
        assert_eq!(url.path(), "/help/docs-center");
    }

    #[test]
    fn test_no_links() {
        assert!(find_docs_url("<p>nothing</p>", &base(), "apitracker.io").is_none());
    }
}
