//! Specification body parsing.
//!
//! JSON is tried first when the body looks JSON-shaped or the source URL
//! suggests JSON; otherwise (or when JSON fails) the body is parsed as YAML,
//! which also accepts most JSON. Only object documents are returned.

use serde_json::Value;
use specscout_core::Error;

/// How strictly a body must be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// JSON first where plausible, then YAML.
    Auto,
    /// JSON only; YAML is never attempted.
    JsonOnly,
}

impl ParseMode {
    /// `JsonOnly` for URLs with an explicit `.json` extension.
    pub fn for_url(url: &str) -> Self {
        if has_json_extension(url) { ParseMode::JsonOnly } else { ParseMode::Auto }
    }
}

/// Whether the URL path ends in `.json`.
pub fn has_json_extension(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.to_ascii_lowercase().ends_with(".json")
}

fn looks_like_json(body: &str) -> bool {
    matches!(body.trim_start_matches('\u{feff}').trim_start().chars().next(), Some('{') | Some('['))
}

/// Parse a specification body into a JSON object tree.
///
/// `source` is the URL the body came from, used only as a format hint.
pub fn parse_spec_body(body: &str, source: Option<&str>, mode: ParseMode) -> Result<Value, Error> {
    let body = body.trim_start_matches('\u{feff}');
    if body.trim().is_empty() {
        return Err(Error::SchemaInvalid("empty document".into()));
    }

    let value = match mode {
        ParseMode::JsonOnly => {
            serde_json::from_str::<Value>(body).map_err(|e| Error::SchemaInvalid(format!("invalid JSON: {e}")))?
        }
        ParseMode::Auto => {
            let json_hint = looks_like_json(body) || source.is_some_and(|s| s.to_ascii_lowercase().contains("json"));
            let json = if json_hint { serde_json::from_str::<Value>(body).ok() } else { None };
            match json {
                Some(value) => value,
                None => parse_yaml(body)?,
            }
        }
    };

    if !value.is_object() {
        return Err(Error::SchemaInvalid("document is not an object".into()));
    }
    Ok(value)
}

fn parse_yaml(body: &str) -> Result<Value, Error> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(body).map_err(|e| Error::SchemaInvalid(format!("invalid YAML: {e}")))?;
    serde_json::to_value(yaml).map_err(|e| Error::SchemaInvalid(format!("unrepresentable YAML: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let value = parse_spec_body(r#"{"openapi":"3.0.0"}"#, None, ParseMode::Auto).unwrap();
        assert_eq!(value["openapi"], "3.0.0");
    }

    #[test]
    fn test_parse_yaml_with_numeric_keys() {
        let body = "openapi: 3.0.1\ninfo:\n  title: Pets\n  version: '1'\npaths:\n  /pets:\n    get:\n      responses:\n        200:\n          description: ok\n";
        let value = parse_spec_body(body, Some("https://x.dev/openapi.yaml"), ParseMode::Auto).unwrap();
        assert_eq!(value["info"]["title"], "Pets");
        assert!(value["paths"]["/pets"]["get"]["responses"]["200"].is_object());
    }

    #[test]
    fn test_scalar_and_array_rejected() {
        assert!(matches!(parse_spec_body("just a string", None, ParseMode::Auto), Err(Error::SchemaInvalid(_))));
        assert!(matches!(parse_spec_body("[1, 2]", None, ParseMode::Auto), Err(Error::SchemaInvalid(_))));
    }

    #[test]
    fn test_json_only_never_falls_back_to_yaml() {
        let yaml = "openapi: 3.0.0\ninfo:\n  title: t\n";
        assert!(parse_spec_body(yaml, None, ParseMode::Auto).is_ok());
        assert!(matches!(parse_spec_body(yaml, None, ParseMode::JsonOnly), Err(Error::SchemaInvalid(_))));
    }

    #[test]
    fn test_mode_for_url() {
        assert_eq!(ParseMode::for_url("https://x.dev/openapi.json"), ParseMode::JsonOnly);
        assert_eq!(ParseMode::for_url("https://x.dev/openapi.JSON?v=2"), ParseMode::JsonOnly);
        assert_eq!(ParseMode::for_url("https://x.dev/openapi.yaml"), ParseMode::Auto);
        assert_eq!(ParseMode::for_url("https://x.dev/v3/api-docs"), ParseMode::Auto);
    }

    #[test]
    fn test_empty_body() {
        assert!(parse_spec_body("   \n", None, ParseMode::Auto).is_err());
    }
}
