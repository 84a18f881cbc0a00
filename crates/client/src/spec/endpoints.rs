//! Conversion of validated documents into normalized endpoints.

use chrono::Utc;
use serde_json::Value;
use specscout_core::{ApiInfo, ExtractionResult, Framework, HttpMethod, NormalizedEndpoint, SpecDocument};

/// Walk `paths` and emit one endpoint per declared operation.
///
/// Path keys come out in lexical order, operations in `HttpMethod::ALL`
/// order. Non-operation keys (`parameters`, `servers`, `$ref`) are ignored.
pub fn endpoints_from_document(doc: &SpecDocument) -> Vec<NormalizedEndpoint> {
    let Some(paths) = doc.raw.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut sorted: Vec<(&String, &Value)> = paths.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut endpoints = Vec::new();
    for (path, item) in sorted {
        let Some(item) = item.as_object() else { continue };
        for method in HttpMethod::ALL {
            let Some(operation) = item.get(&method.as_str().to_ascii_lowercase()) else { continue };
            endpoints.push(endpoint_from_operation(method, path, operation));
        }
    }
    endpoints
}

fn endpoint_from_operation(method: HttpMethod, path: &str, operation: &Value) -> NormalizedEndpoint {
    let text = |field: &str| {
        operation
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let description = text("summary").or_else(|| text("description")).unwrap_or_default();
    let tags = operation
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    let mut endpoint = NormalizedEndpoint::new(method, path)
        .with_description(description)
        .with_tags(tags);
    endpoint.operation_id = text("operationId").map(str::to_string);
    endpoint
}

/// `info` block of a validated document.
pub fn api_info(doc: &SpecDocument) -> ApiInfo {
    let info = doc.raw.get("info");
    let field = |name: &str| {
        info.and_then(|i| i.get(name))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string()
    };
    ApiInfo { title: doc.title.clone(), version: field("version"), description: field("description") }
}

/// Build a pipeline result from a document fetched as-is.
pub fn result_from_document(doc: &SpecDocument, strategy: &str, source_url: &str) -> ExtractionResult {
    ExtractionResult {
        framework: Framework::from(doc.spec_type),
        strategy: strategy.to_string(),
        api_info: api_info(doc),
        endpoints: endpoints_from_document(doc),
        source_url: source_url.to_string(),
        extracted_at: Utc::now(),
        spec_type: Some(doc.spec_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::validate::into_document;
    use serde_json::json;

    fn doc() -> SpecDocument {
        into_document(json!({
            "openapi": "3.0.0",
            "info": {"title": "Petstore", "version": "1.2.0", "description": "Pets API"},
            "paths": {
                "/pets/{id}": {
                    "parameters": [{"name": "id", "in": "path"}],
                    "delete": {"description": "Remove a pet"},
                    "get": {"summary": " Get pet ", "description": "long text", "operationId": "getPet"}
                },
                "/pets": {
                    "post": {"summary": "Create", "tags": ["pets", "write"]},
                    "get": {"summary": "List pets", "tags": ["pets"]}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_endpoints_order_and_fields() {
        let endpoints = endpoints_from_document(&doc());
        let keys: Vec<_> = endpoints.iter().map(|e| format!("{} {}", e.method, e.path)).collect();
        assert_eq!(keys, vec!["GET /pets", "POST /pets", "GET /pets/{id}", "DELETE /pets/{id}"]);

        assert_eq!(endpoints[1].tags, vec!["pets", "write"]);
        assert_eq!(endpoints[2].description, "Get pet");
        assert_eq!(endpoints[2].operation_id.as_deref(), Some("getPet"));
        assert_eq!(endpoints[3].description, "Remove a pet");
    }

    #[test]
    fn test_no_paths_yields_empty() {
        let doc = into_document(json!({"openapi": "3.1.0", "info": {"title": "t"}, "components": {}})).unwrap();
        assert!(endpoints_from_document(&doc).is_empty());
    }

    #[test]
    fn test_result_from_document() {
        let result = result_from_document(&doc(), "direct", "https://pets.dev/openapi.json");
        assert_eq!(result.framework, Framework::OpenApi);
        assert_eq!(result.strategy, "direct");
        assert_eq!(result.api_info.title, "Petstore");
        assert_eq!(result.api_info.version, "1.2.0");
        assert_eq!(result.api_info.description, "Pets API");
        assert_eq!(result.endpoints.len(), 4);
        assert_eq!(result.spec_type, Some(specscout_core::SpecType::OpenApi));
    }
}
