//! Documentation framework detection for rendered pages.
//!
//! Frameworks are probed in priority order (Swagger UI, Redoc, Stoplight
//! Elements) by DOM marker and, where scripts run, by in-page state handle.
//! A page with none of them but with method and path tokens in its text is
//! `generic`; anything else is undetected (`None`).

use crate::render::RenderedPage;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::Value;
use specscout_core::{Error, Framework};
use std::sync::LazyLock;

static METHOD_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS|TRACE)\b").expect("invalid method pattern"));

static PATH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[\s(>])/[A-Za-z0-9_{}:.\-]+").expect("invalid path pattern"));

struct Probe {
    framework: Framework,
    markers: LazyLock<Selector>,
    state: &'static str,
}

static PROBES: [Probe; 3] = [
    Probe {
        framework: Framework::SwaggerUi,
        markers: LazyLock::new(|| {
            Selector::parse(r#"#swagger-ui, .swagger-ui, script[src*="swagger-ui"], link[href*="swagger-ui"]"#)
                .expect("invalid selector")
        }),
        state: "(() => { try { return !!(window.ui && window.ui.specSelectors) || typeof window.SwaggerUIBundle === 'function'; } catch (e) { return false; } })()",
    },
    Probe {
        framework: Framework::Redoc,
        markers: LazyLock::new(|| {
            Selector::parse(r#"redoc, .redoc-wrap, [data-role="redoc"], script[src*="redoc"]"#).expect("invalid selector")
        }),
        state: "(() => { try { return !!window.__redoc_state || typeof window.Redoc === 'object'; } catch (e) { return false; } })()",
    },
    Probe {
        framework: Framework::Stoplight,
        markers: LazyLock::new(|| {
            Selector::parse(r#"elements-api, elements-stoplight-project, .sl-elements, script[src*="@stoplight/elements"]"#)
                .expect("invalid selector")
        }),
        state: "(() => { try { return !!document.querySelector('elements-api') || !!(window.customElements && window.customElements.get('elements-api')); } catch (e) { return false; } })()",
    },
];

/// Text of every node outside `script`, `style`, `noscript`, `template`,
/// whitespace-collapsed.
pub(crate) fn visible_text(root: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else { continue };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
        });
        if !hidden {
            parts.push(&**text);
        }
    }
    parts.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Frameworks whose DOM markers appear in the markup, in priority order.
fn marker_hits(html: &str) -> Vec<Framework> {
    let document = Html::parse_document(html);
    PROBES
        .iter()
        .filter(|p| document.select(&p.markers).next().is_some())
        .map(|p| p.framework)
        .collect()
}

/// Whether the visible text has both HTTP-method and path-like tokens.
pub fn looks_like_endpoint_listing(html: &str) -> bool {
    let document = Html::parse_document(html);
    let text = visible_text(document.root_element());
    METHOD_TOKEN.is_match(&text) && PATH_TOKEN.is_match(&text)
}

/// Detect the documentation framework of an open page.
pub async fn detect(page: &dyn RenderedPage) -> Result<Option<Framework>, Error> {
    let html = page.html().await?;
    let markers = marker_hits(&html);

    for probe in &PROBES {
        if markers.contains(&probe.framework) {
            tracing::debug!("detected {} by DOM marker on {}", probe.framework, page.url());
            return Ok(Some(probe.framework));
        }
        if page.supports_scripts()
            && let Ok(Some(Value::Bool(true))) = page.evaluate(probe.state).await
        {
            tracing::debug!("detected {} by page state on {}", probe.framework, page.url());
            return Ok(Some(probe.framework));
        }
    }

    if looks_like_endpoint_listing(&html) {
        tracing::debug!("no framework markers on {}, treating as generic", page.url());
        return Ok(Some(Framework::Generic));
    }

    tracing::debug!("no framework detected on {}", page.url());
    Ok(None)
}

/// Expression that reports a framework's state handle, for tests and
/// callers that pre-compute page state.
pub fn state_probe(framework: Framework) -> Option<&'static str> {
    PROBES.iter().find(|p| p.framework == framework).map(|p| p.state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::StaticPage;
    use serde_json::json;
    use url::Url;

    fn page(html: &str) -> StaticPage {
        StaticPage::new(Url::parse("https://docs.example.com/").unwrap(), html)
    }

    #[tokio::test]
    async fn test_swagger_ui_marker() {
        let p = page(r#"<html><body><div id="swagger-ui"></div></body></html>"#);
        assert_eq!(detect(&p).await.unwrap(), Some(Framework::SwaggerUi));
    }

    #[tokio::test]
    async fn test_redoc_and_stoplight_markers() {
        let p = page("<html><body><redoc spec-url=\"/openapi.json\"></redoc></body></html>");
        assert_eq!(detect(&p).await.unwrap(), Some(Framework::Redoc));

        let p = page(r#"<html><body><elements-api apiDescriptionUrl="/openapi.yaml"></elements-api></body></html>"#);
        assert_eq!(detect(&p).await.unwrap(), Some(Framework::Stoplight));
    }

    #[tokio::test]
    async fn test_priority_prefers_swagger_ui() {
        let p = page(r#"<div class="swagger-ui"></div><div class="redoc-wrap"></div>"#);
        assert_eq!(detect(&p).await.unwrap(), Some(Framework::SwaggerUi));
    }

    #[tokio::test]
    async fn test_state_handle_detection() {
        let probe = state_probe(Framework::Redoc).unwrap();
        let p = page("<div id=\"app\"></div>").with_evaluation(probe, json!(true));
        assert_eq!(detect(&p).await.unwrap(), Some(Framework::Redoc));
    }

    #[tokio::test]
    async fn test_generic_from_method_and_path_text() {
        let p = page("<main><h2>Endpoints</h2><p>GET /v1/users returns users.</p></main>");
        assert_eq!(detect(&p).await.unwrap(), Some(Framework::Generic));
    }

    #[tokio::test]
    async fn test_undetected() {
        let p = page("<main><p>Welcome to our marketing site.</p></main>");
        assert_eq!(detect(&p).await.unwrap(), None);

        let p = page("<main><p>GET started today!</p></main>");
        assert_eq!(detect(&p).await.unwrap(), None);
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let document = Html::parse_document(
            "<body><p>Hello</p><script>var x = 'GET /secret';</script><style>p{}</style><p>world</p></body>",
        );
        assert_eq!(visible_text(document.root_element()), "Hello world");
    }
}
