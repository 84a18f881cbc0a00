//! DOM heuristics: operation blocks, sidebar links, tables, code blocks,
//! and whole-page text.

use super::{ExtractionLayer, LayerContext, LayerOutput};
use crate::detect::visible_text;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use specscout_core::{ApiInfo, Error, Framework, HttpMethod, NormalizedEndpoint};
use std::sync::LazyLock;

static ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS|TRACE)\s+(/[^\s"'<>`]*)"#).expect("invalid endpoint pattern")
});

static SIDEBAR_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS|TRACE)\s+(/\S*)").expect("invalid sidebar pattern")
});

static SIDEBAR_ITEMS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("nav a, aside a, [role=navigation] a, li a, li, label").expect("invalid selector"));
static CODE_BLOCKS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("pre, code").expect("invalid selector"));
static TABLES: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").expect("invalid selector"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("invalid selector"));
static CELLS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").expect("invalid selector"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title, h1").expect("invalid selector"));

/// Selectors describing one framework's rendered operation blocks.
struct OperationMarkup {
    block: Selector,
    method: Selector,
    path: Selector,
    summary: Selector,
}

impl OperationMarkup {
    fn new(block: &str, method: &str, path: &str, summary: &str) -> Self {
        Self {
            block: Selector::parse(block).expect("invalid selector"),
            method: Selector::parse(method).expect("invalid selector"),
            path: Selector::parse(path).expect("invalid selector"),
            summary: Selector::parse(summary).expect("invalid selector"),
        }
    }
}

static SWAGGER_UI_MARKUP: LazyLock<OperationMarkup> = LazyLock::new(|| {
    OperationMarkup::new(
        ".opblock",
        ".opblock-summary-method",
        ".opblock-summary-path, .opblock-summary-path__deprecated",
        ".opblock-summary-description",
    )
});

static REDOC_MARKUP: LazyLock<OperationMarkup> = LazyLock::new(|| {
    OperationMarkup::new(
        r#"[data-section-id^="operation/"]"#,
        ".http-verb",
        ".http-verb + span, .http-verb + div",
        "h2",
    )
});

static STOPLIGHT_MARKUP: LazyLock<OperationMarkup> = LazyLock::new(|| {
    OperationMarkup::new(
        r#".HttpOperation, [data-testid="operation"]"#,
        r#".sl-badge, [data-testid="http-method"]"#,
        r#".HttpOperation__Path, [data-testid="operation-path"]"#,
        "h1, h2",
    )
});

fn markup_for(framework: Framework) -> Option<&'static OperationMarkup> {
    match framework {
        Framework::SwaggerUi => Some(&SWAGGER_UI_MARKUP),
        Framework::Redoc => Some(&REDOC_MARKUP),
        Framework::Stoplight => Some(&STOPLIGHT_MARKUP),
        _ => None,
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim punctuation that prose leaves stuck to a path.
fn clean_path(raw: &str) -> Option<String> {
    let start = raw.find('/')?;
    let path = raw[start..]
        .split_whitespace()
        .next()?
        .trim_end_matches(['.', ',', ';', ':', ')', ']', '!', '?']);
    (!path.is_empty()).then(|| path.to_string())
}

/// Deduplicate by `(method, path)`, keeping the first occurrence.
pub fn dedupe(endpoints: Vec<NormalizedEndpoint>) -> Vec<NormalizedEndpoint> {
    let mut seen = std::collections::HashSet::new();
    endpoints
        .into_iter()
        .filter(|e| seen.insert((e.method, e.path.clone())))
        .collect()
}

/// `METHOD /path` occurrences in free text.
pub fn endpoints_in_text(text: &str) -> Vec<NormalizedEndpoint> {
    ENDPOINT
        .captures_iter(text)
        .filter_map(|caps| {
            let method = caps[1].parse::<HttpMethod>().ok()?;
            let path = clean_path(&caps[2])?;
            Some(NormalizedEndpoint::new(method, path))
        })
        .collect()
}

fn operation_blocks(document: &Html, markup: &OperationMarkup) -> Vec<NormalizedEndpoint> {
    let mut endpoints = Vec::new();
    for block in document.select(&markup.block) {
        let Some(method) = block
            .select(&markup.method)
            .next()
            .and_then(|m| text_of(m).parse::<HttpMethod>().ok())
        else {
            continue;
        };
        let Some(path_el) = block.select(&markup.path).next() else { continue };
        let raw_path = path_el.value().attr("data-path").map(str::to_string).unwrap_or_else(|| text_of(path_el));
        let Some(path) = clean_path(&raw_path) else { continue };

        let summary = block.select(&markup.summary).next().map(text_of).unwrap_or_default();
        endpoints.push(NormalizedEndpoint::new(method, path).with_description(summary));
    }
    endpoints
}

fn sidebar_entries(document: &Html) -> Vec<NormalizedEndpoint> {
    document
        .select(&SIDEBAR_ITEMS)
        .filter_map(|el| {
            let text = text_of(el);
            let caps = SIDEBAR_ENTRY.captures(&text)?;
            let method = caps[1].parse::<HttpMethod>().ok()?;
            let path = clean_path(&caps[2])?;
            let rest = text[caps.get(0).map_or(0, |m| m.end())..].trim().to_string();
            Some(NormalizedEndpoint::new(method, path).with_description(rest))
        })
        .collect()
}

fn code_blocks(document: &Html) -> Vec<NormalizedEndpoint> {
    document
        .select(&CODE_BLOCKS)
        .flat_map(|el| endpoints_in_text(&el.text().collect::<String>()))
        .collect()
}

fn column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.iter().any(|n| h.contains(n)))
}

fn tables(document: &Html) -> Vec<NormalizedEndpoint> {
    let mut endpoints = Vec::new();
    for table in document.select(&TABLES) {
        let mut rows = table.select(&ROWS);
        let Some(header) = rows.next() else { continue };
        let headers: Vec<String> = header.select(&CELLS).map(|c| text_of(c).to_lowercase()).collect();

        let Some(method_col) = column(&headers, &["method", "verb"]) else { continue };
        let Some(path_col) = column(&headers, &["path", "endpoint", "url", "route", "resource"]) else { continue };
        let description_col = column(&headers, &["description", "summary", "purpose"]);

        for row in rows {
            let cells: Vec<String> = row.select(&CELLS).map(text_of).collect();
            let Some(method) = cells.get(method_col).and_then(|m| m.parse::<HttpMethod>().ok()) else { continue };
            let Some(path) = cells.get(path_col).and_then(|p| clean_path(p)) else { continue };
            let description = description_col.and_then(|i| cells.get(i)).cloned().unwrap_or_default();
            endpoints.push(NormalizedEndpoint::new(method, path).with_description(description));
        }
    }
    endpoints
}

/// Title from `<title>`, falling back to the first `<h1>`.
pub fn page_title(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&TITLE)
        .map(text_of)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

/// Framework DOM cascade: operation blocks, then sidebar entries, then
/// page text. Each stage runs only if the previous found nothing.
pub fn framework_endpoints(html: &str, framework: Framework) -> Vec<NormalizedEndpoint> {
    let document = Html::parse_document(html);

    if let Some(markup) = markup_for(framework) {
        let found = operation_blocks(&document, markup);
        if !found.is_empty() {
            return dedupe(found);
        }
    }

    let found = sidebar_entries(&document);
    if !found.is_empty() {
        return dedupe(found);
    }

    dedupe(endpoints_in_text(&visible_text(document.root_element())))
}

/// Generic page heuristics: code blocks, method/path tables, page text,
/// merged in that order.
pub fn generic_endpoints(html: &str) -> Vec<NormalizedEndpoint> {
    let document = Html::parse_document(html);
    let mut found = code_blocks(&document);
    found.extend(tables(&document));
    found.extend(endpoints_in_text(&visible_text(document.root_element())));
    dedupe(found)
}

/// DOM layer for detected frameworks.
pub struct DomLayer;

#[async_trait::async_trait]
impl ExtractionLayer for DomLayer {
    fn name(&self) -> &'static str {
        "dom"
    }

    async fn extract(&self, cx: &LayerContext<'_>) -> Result<LayerOutput, Error> {
        let endpoints = framework_endpoints(&cx.html, cx.framework);
        Ok(LayerOutput::from_endpoints(endpoints, ApiInfo { title: page_title(&cx.html), ..Default::default() }))
    }
}

/// Heuristics for pages without a recognised framework.
pub struct GenericLayer;

#[async_trait::async_trait]
impl ExtractionLayer for GenericLayer {
    fn name(&self) -> &'static str {
        "generic"
    }

    async fn extract(&self, cx: &LayerContext<'_>) -> Result<LayerOutput, Error> {
        let endpoints = generic_endpoints(&cx.html);
        Ok(LayerOutput::from_endpoints(endpoints, ApiInfo { title: page_title(&cx.html), ..Default::default() }))
    }
}
