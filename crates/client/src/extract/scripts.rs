//! Embedded script inspection.
//!
//! Looks for spec object literals (`spec: {...}`, `Redoc.init({...})`)
//! and spec URL declarations (`url:`, `specUrl`, `spec-url`,
//! `apiDescriptionUrl`, `configUrl`, `Redoc.init("...")`) in inline
//! scripts and framework element attributes. Literals go through the
//! structured-literal parser; nothing is executed.

use super::{ExtractionLayer, LayerContext, LayerOutput};
use crate::fetch::{ACCEPT_SPEC, FetchClient};
use crate::spec::{ParseMode, balanced_literal, into_document, parse_literal, parse_spec_body};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use specscout_core::{Error, SpecDocument};
use std::sync::LazyLock;
use url::Url;

/// Most URL declarations fetched per page.
const MAX_URLS: usize = 5;

static INLINE_SCRIPTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script:not([src])").expect("invalid selector"));

static SPEC_ATTRIBUTES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("redoc[spec-url], elements-api[apidescriptionurl], [data-spec-url]").expect("invalid selector")
});

static SPEC_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bspec\s*:\s*\{").expect("invalid spec literal pattern"));

static REDOC_INIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Redoc\.init\(\s*(?:["'`]([^"'`]+)["'`]|(\{))"#).expect("invalid Redoc.init pattern")
});

static URL_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:\b(?:url|specUrl|apiDescriptionUrl|configUrl)|["']spec-url["'])\s*[:=]\s*["'`]([^"'`\s]+)["'`]"#)
        .expect("invalid url declaration pattern")
});

/// What the page's scripts and attributes point at.
#[derive(Debug, Default, PartialEq)]
pub struct ScriptFindings {
    /// Inline literals that parsed cleanly.
    pub literals: Vec<Value>,
    /// Declared spec URLs, as written.
    pub urls: Vec<String>,
}

/// Scan inline scripts and spec attributes.
pub fn inspect_scripts(html: &str) -> ScriptFindings {
    let document = Html::parse_document(html);
    let mut findings = ScriptFindings::default();

    for script in document.select(&INLINE_SCRIPTS) {
        let source = script.text().collect::<String>();

        let literal_starts = SPEC_LITERAL
            .find_iter(&source)
            .map(|m| m.end() - 1)
            .chain(REDOC_INIT.captures_iter(&source).filter_map(|c| c.get(2)).map(|m| m.start()));
        for start in literal_starts {
            let Some(literal) = balanced_literal(&source, start) else { continue };
            match parse_literal(literal) {
                Ok(value) => findings.literals.push(value),
                Err(e) => tracing::debug!("skipping inline literal: {}", e),
            }
        }

        let declared = REDOC_INIT
            .captures_iter(&source)
            .filter_map(|c| c.get(1))
            .chain(URL_DECLARATION.captures_iter(&source).filter_map(|c| c.get(1)));
        for m in declared {
            push_unique(&mut findings.urls, m.as_str());
        }
    }

    for element in document.select(&SPEC_ATTRIBUTES) {
        for attr in ["spec-url", "apidescriptionurl", "data-spec-url"] {
            if let Some(value) = element.value().attr(attr) {
                push_unique(&mut findings.urls, value);
            }
        }
    }

    findings
}

fn push_unique(urls: &mut Vec<String>, candidate: &str) {
    let candidate = candidate.trim();
    if !candidate.is_empty() && !urls.iter().any(|u| u == candidate) {
        urls.push(candidate.to_string());
    }
}

/// URLs a swagger-config document points at (`url`, `urls[].url`).
fn config_urls(raw: &Value) -> Vec<String> {
    let mut urls: Vec<String> = raw.get("url").and_then(Value::as_str).map(str::to_string).into_iter().collect();
    if let Some(list) = raw.get("urls").and_then(Value::as_array) {
        urls.extend(list.iter().filter_map(|u| u.get("url")?.as_str().map(str::to_string)));
    }
    urls
}

async fn fetch_raw(fetch: &FetchClient, url: &Url) -> Result<Value, Error> {
    let response = fetch.fetch(url.as_str(), ACCEPT_SPEC).await?;
    parse_spec_body(&response.text(), Some(url.as_str()), ParseMode::for_url(url.as_str()))
}

/// Fetch a declared URL, following one swagger-config indirection.
async fn fetch_document(fetch: &FetchClient, url: &Url) -> Result<(SpecDocument, Url), Error> {
    let raw = fetch_raw(fetch, url).await?;
    let nested = config_urls(&raw);
    let err = match into_document(raw) {
        Ok(doc) => return Ok((doc, url.clone())),
        Err(e) => e,
    };

    for candidate in nested {
        let Ok(target) = url.join(&candidate) else { continue };
        tracing::debug!("following config {} to {}", url, target);
        match fetch_raw(fetch, &target).await.and_then(into_document) {
            Ok(doc) => return Ok((doc, target)),
            Err(e) => tracing::debug!("config target {} unusable: {}", target, e),
        }
    }
    Err(err)
}

pub struct ScriptLayer;

#[async_trait::async_trait]
impl ExtractionLayer for ScriptLayer {
    fn name(&self) -> &'static str {
        "scripts"
    }

    async fn extract(&self, cx: &LayerContext<'_>) -> Result<LayerOutput, Error> {
        let findings = inspect_scripts(&cx.html);

        for literal in findings.literals {
            match into_document(literal) {
                Ok(doc) => {
                    let output = LayerOutput::from_document(&doc, None);
                    if !output.is_empty() {
                        return Ok(output);
                    }
                }
                Err(e) => tracing::debug!("inline literal is not a spec: {}", e),
            }
        }

        let base = cx.page.url();
        let mut targets: Vec<Url> = Vec::new();
        for declared in &findings.urls {
            if let Ok(url) = base.join(declared)
                && matches!(url.scheme(), "http" | "https")
                && !targets.contains(&url)
            {
                targets.push(url);
            }
        }

        for url in targets.into_iter().take(MAX_URLS) {
            match fetch_document(cx.fetch, &url).await {
                Ok((doc, source)) => {
                    let output = LayerOutput::from_document(&doc, Some(source.to_string()));
                    if !output.is_empty() {
                        return Ok(output);
                    }
                }
                Err(e) => tracing::debug!("declared spec url {} unusable: {}", url, e),
            }
        }

        Ok(LayerOutput::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchConfig;
    use crate::render::StaticPage;
    use specscout_core::Framework;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SPEC_JSON: &str = r#"{"openapi":"3.0.0","info":{"title":"Remote"},"paths":{"/remote":{"get":{"summary":"Remote op"}}}}"#;

    async fn run(page_url: &str, html: &str) -> LayerOutput {
        let page = StaticPage::new(Url::parse(page_url).unwrap(), html);
        let fetch = FetchClient::new(FetchConfig::default()).unwrap();
        let cx = LayerContext::new(&page, Framework::SwaggerUi, &fetch).await.unwrap();
        ScriptLayer.extract(&cx).await.unwrap()
    }

    #[test]
    fn test_inspect_inline_literal() {
        let html = r#"<script>
            const ui = SwaggerUIBundle({
              dom_id: '#swagger-ui',
              spec: {
                openapi: '3.0.0',
                info: { title: 'Inline', },
                paths: { '/inline': { get: { summary: 'Inline op' } } }, // done
              },
            });
        </script>"#;
        let findings = inspect_scripts(html);
        assert_eq!(findings.literals.len(), 1);
        assert_eq!(findings.literals[0]["info"]["title"], "Inline");
    }

    #[test]
    fn test_inspect_url_declarations() {
        let html = r#"
            <script src="/swagger-ui-bundle.js"></script>
            <script>window.onload = () => { SwaggerUIBundle({ url: "/v3/api-docs", dom_id: '#ui' }); };</script>
            <script>Redoc.init('https://cdn.acme.io/openapi.yaml', {}, el)</script>
            <redoc spec-url="/redoc/openapi.json"></redoc>
            <elements-api apiDescriptionUrl="/v3/api-docs"></elements-api>
        "#;
        let findings = inspect_scripts(html);
        assert!(findings.literals.is_empty());
        assert_eq!(findings.urls, vec!["/v3/api-docs", "https://cdn.acme.io/openapi.yaml", "/redoc/openapi.json"]);
    }

    #[tokio::test]
    async fn test_inline_literal_wins_without_fetching() {
        let html = r#"<script>SwaggerUIBundle({ spec: { swagger: "2.0", info: {title: 'Inline'}, paths: { "/a": { post: {} } } } })</script>"#;
        let output = run("https://acme.io/docs", html).await;
        assert_eq!(output.endpoints.len(), 1);
        assert_eq!(output.endpoints[0].path, "/a");
        assert!(output.source_url.is_none());
    }

    #[tokio::test]
    async fn test_declared_url_is_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/api-docs"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SPEC_JSON, "application/json"))
            .mount(&server)
            .await;

        let html = r#"<script>SwaggerUIBundle({ url: "/v3/api-docs" })</script>"#;
        let output = run(&format!("{}/swagger-ui/index.html", server.uri()), html).await;
        assert_eq!(output.endpoints[0].path, "/remote");
        assert_eq!(output.source_url, Some(format!("{}/v3/api-docs", server.uri())));
    }

    #[tokio::test]
    async fn test_swagger_config_indirection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/api-docs/swagger-config"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"configUrl":"/v3/api-docs/swagger-config","urls":[{"name":"default","url":"/v3/api-docs/default"}]}"#,
                "application/json",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/api-docs/default"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SPEC_JSON, "application/json"))
            .mount(&server)
            .await;

        let html = r#"<script>const cfg = { configUrl: '/v3/api-docs/swagger-config' };</script>"#;
        let output = run(&format!("{}/swagger-ui/index.html", server.uri()), html).await;
        assert_eq!(output.endpoints.len(), 1);
        assert!(output.source_url.unwrap().ends_with("/v3/api-docs/default"));
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let output = run("https://acme.io/docs", "<script>console.log('hello')</script>").await;
        assert!(output.is_empty());
    }
}
