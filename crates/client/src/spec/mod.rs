//! OpenAPI / Swagger document handling: parsing, validation, and
//! normalization into endpoints.

pub mod endpoints;
pub mod literal;
pub mod parse;
pub mod validate;

pub use endpoints::{api_info, endpoints_from_document, result_from_document};
pub use literal::{LiteralError, balanced_literal, parse_literal};
pub use parse::{ParseMode, has_json_extension, parse_spec_body};
pub use validate::{into_document, validate};

use specscout_core::{Error, SpecDocument};

/// Parse and validate a fetched body in one step.
pub fn load_document(body: &str, source: Option<&str>, mode: ParseMode) -> Result<SpecDocument, Error> {
    into_document(parse_spec_body(body, source, mode)?)
}

/// Whether a URL path looks like it names a spec document.
///
/// Matches `.json`/`.yaml`/`.yml` extensions and the usual spec path
/// keywords.
pub fn is_spec_reference(url: &str) -> bool {
    let path = url
        .split_once("://")
        .map_or(url, |(_, rest)| rest.find('/').map_or("", |i| &rest[i..]));
    let path = path.split(['?', '#']).next().unwrap_or(path).to_ascii_lowercase();

    if [".json", ".yaml", ".yml"].iter().any(|ext| path.ends_with(ext)) {
        return true;
    }
    ["openapi", "swagger", "api-docs", "api-spec"].iter().any(|kw| path.contains(kw))
}
