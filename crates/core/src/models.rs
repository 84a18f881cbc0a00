//! Normalized data model shared by the pipeline, cache, and server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP methods an endpoint may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| format!("unknown HTTP method: {s}"))
    }
}

/// A single API operation in strategy-agnostic form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEndpoint {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
}

impl NormalizedEndpoint {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), description: String::new(), tags: Vec::new(), operation_id: None }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Deduplication key.
    pub fn key(&self) -> (HttpMethod, &str) {
        (self.method, self.path.as_str())
    }
}

/// Which machine-readable format a document declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecType {
    OpenApi,
    Swagger,
}

impl fmt::Display for SpecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecType::OpenApi => f.write_str("openapi"),
            SpecType::Swagger => f.write_str("swagger"),
        }
    }
}

/// A parsed and structurally validated specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecDocument {
    pub raw: serde_json::Value,
    pub spec_type: SpecType,
    pub spec_version: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Documentation source that produced an extraction result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framework {
    /// A machine-readable OpenAPI 3.x document.
    OpenApi,
    /// A machine-readable Swagger 2.0 document.
    Swagger,
    SwaggerUi,
    Redoc,
    Stoplight,
    Generic,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::OpenApi => "openapi",
            Framework::Swagger => "swagger",
            Framework::SwaggerUi => "swagger-ui",
            Framework::Redoc => "redoc",
            Framework::Stoplight => "stoplight",
            Framework::Generic => "generic",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SpecType> for Framework {
    fn from(spec_type: SpecType) -> Self {
        match spec_type {
            SpecType::OpenApi => Framework::OpenApi,
            SpecType::Swagger => Framework::Swagger,
        }
    }
}

/// Top-level API metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

/// Normalized output of the acquisition pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub framework: Framework,
    /// Name of the pipeline strategy that produced this result.
    pub strategy: String,
    pub api_info: ApiInfo,
    pub endpoints: Vec<NormalizedEndpoint>,
    pub source_url: String,
    pub extracted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_type: Option<SpecType>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!(" Delete ".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("FETCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_method_serializes_uppercase() {
        let json = serde_json::to_string(&HttpMethod::Patch).unwrap();
        assert_eq!(json, "\"PATCH\"");
    }

    #[test]
    fn test_framework_serializes_kebab_case() {
        let json = serde_json::to_string(&Framework::SwaggerUi).unwrap();
        assert_eq!(json, "\"swagger-ui\"");
        assert_eq!(Framework::SwaggerUi.to_string(), "swagger-ui");
    }

    #[test]
    fn test_endpoint_defaults_on_deserialize() {
        let endpoint: NormalizedEndpoint = serde_json::from_str(r#"{"method":"GET","path":"/pets"}"#).unwrap();
        assert_eq!(endpoint.description, "");
        assert!(endpoint.tags.is_empty());
        assert!(endpoint.operation_id.is_none());
    }
}
