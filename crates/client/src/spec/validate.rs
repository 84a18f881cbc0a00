//! Minimal structural validation of OpenAPI 3.x and Swagger 2.0 documents.
//!
//! A document qualifies as OpenAPI when it declares a `3.x` version, has an
//! `info` object, and has at least one of `paths`, `webhooks`, `components`.
//! It qualifies as Swagger when it declares `swagger: "2.0"` with `info`
//! and `paths`. Nothing deeper is checked.

use serde_json::Value;
use specscout_core::{Error, SpecDocument, SpecType};

fn has_object(value: &Value, field: &str) -> bool {
    value.get(field).is_some_and(Value::is_object)
}

fn version_string(value: &Value, field: &str) -> Option<String> {
    match value.get(field)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Classify a parsed document, or explain why it is not a spec.
pub fn validate(value: &Value) -> Result<SpecType, Error> {
    if !value.is_object() {
        return Err(Error::SchemaInvalid("document is not an object".into()));
    }

    if let Some(version) = version_string(value, "openapi") {
        if !version.starts_with("3.") {
            return Err(Error::SchemaInvalid(format!("unsupported openapi version {version}")));
        }
        if !has_object(value, "info") {
            return Err(Error::SchemaInvalid("openapi document has no info object".into()));
        }
        if !["paths", "webhooks", "components"].iter().any(|f| has_object(value, f)) {
            return Err(Error::SchemaInvalid("openapi document has no paths, webhooks, or components".into()));
        }
        return Ok(SpecType::OpenApi);
    }

    if let Some(version) = version_string(value, "swagger") {
        if version != "2.0" {
            return Err(Error::SchemaInvalid(format!("unsupported swagger version {version}")));
        }
        if !has_object(value, "info") || !has_object(value, "paths") {
            return Err(Error::SchemaInvalid("swagger document requires info and paths".into()));
        }
        return Ok(SpecType::Swagger);
    }

    Err(Error::SchemaInvalid("no openapi or swagger version declared".into()))
}

/// Validate and wrap a parsed tree as a `SpecDocument`.
pub fn into_document(raw: Value) -> Result<SpecDocument, Error> {
    let spec_type = validate(&raw)?;
    let version_field = match spec_type {
        SpecType::OpenApi => "openapi",
        SpecType::Swagger => "swagger",
    };
    let spec_version = version_string(&raw, version_field).unwrap_or_default();
    let title = raw
        .pointer("/info/title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();
    let base_url = base_url(&raw, spec_type);

    Ok(SpecDocument { raw, spec_type, spec_version, title, base_url })
}

fn base_url(raw: &Value, spec_type: SpecType) -> Option<String> {
    match spec_type {
        SpecType::OpenApi => raw
            .pointer("/servers/0/url")
            .and_then(Value::as_str)
            .map(str::to_string),
        SpecType::Swagger => {
            let host = raw.get("host").and_then(Value::as_str)?;
            let scheme = raw
                .pointer("/schemes/0")
                .and_then(Value::as_str)
                .unwrap_or("https");
            let base_path = raw.get("basePath").and_then(Value::as_str).unwrap_or("");
            Some(format!("{scheme}://{host}{base_path}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn petstore() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": {"title": "Petstore", "version": "1.0.0"},
            "paths": {"/pets": {"get": {"summary": "List pets"}}}
        })
    }

    #[test]
    fn test_openapi_passes() {
        assert_eq!(validate(&petstore()).unwrap(), SpecType::OpenApi);
    }

    #[test]
    fn test_openapi_2_without_swagger_field_fails() {
        let mut doc = petstore();
        doc["openapi"] = json!("2.0");
        assert!(matches!(validate(&doc), Err(Error::SchemaInvalid(_))));
    }

    #[test]
    fn test_openapi_components_only_passes() {
        let doc = json!({"openapi": "3.1.0", "info": {"title": "t"}, "components": {}});
        assert_eq!(validate(&doc).unwrap(), SpecType::OpenApi);
    }

    #[test]
    fn test_openapi_without_info_fails() {
        let doc = json!({"openapi": "3.0.3", "paths": {}});
        assert!(validate(&doc).is_err());
    }

    #[test]
    fn test_swagger_passes_and_requires_paths() {
        let doc = json!({"swagger": "2.0", "info": {"title": "t"}, "paths": {}});
        assert_eq!(validate(&doc).unwrap(), SpecType::Swagger);

        let no_paths = json!({"swagger": "2.0", "info": {"title": "t"}});
        assert!(validate(&no_paths).is_err());

        let wrong_version = json!({"swagger": "1.2", "info": {"title": "t"}, "paths": {}});
        assert!(validate(&wrong_version).is_err());
    }

    #[test]
    fn test_non_spec_fails() {
        assert!(validate(&json!({"name": "package.json"})).is_err());
        assert!(validate(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_into_document_fields() {
        let doc = into_document(json!({
            "openapi": "3.0.0",
            "info": {"title": " Petstore ", "version": "1.0.0"},
            "servers": [{"url": "https://api.pets.dev/v1"}],
            "paths": {}
        }))
        .unwrap();
        assert_eq!(doc.spec_type, SpecType::OpenApi);
        assert_eq!(doc.spec_version, "3.0.0");
        assert_eq!(doc.title, "Petstore");
        assert_eq!(doc.base_url.as_deref(), Some("https://api.pets.dev/v1"));
    }

    #[test]
    fn test_swagger_base_url() {
        let doc = into_document(json!({
            "swagger": "2.0",
            "info": {"title": "Legacy"},
            "host": "legacy.example.com",
            "basePath": "/api",
            "schemes": ["http"],
            "paths": {}
        }))
        .unwrap();
        assert_eq!(doc.base_url.as_deref(), Some("http://legacy.example.com/api"));
    }
}
