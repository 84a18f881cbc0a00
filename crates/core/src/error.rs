//! Unified error taxonomy for specscout.
//!
//! Every failure the acquisition pipeline, discovery resolver, or cache can
//! produce maps onto one of these variants. Each variant carries a stable
//! code prefix in its display form and a stable MCP error code.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Outcome of one pipeline strategy, recorded for failure reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    /// Strategy name (e.g. "direct-fetch").
    pub strategy: String,
    /// Short description of why it produced nothing.
    pub outcome: String,
}

impl std::fmt::Display for StrategyAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.strategy, self.outcome)
    }
}

fn format_attempts(attempts: &[StrategyAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unified error types for specscout.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty target).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// No cache entry, provider, or spec matched.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Cache entry exists but is past its expiry.
    #[error("EXPIRED: {0}")]
    Expired(String),

    /// Network or render timeout.
    #[error("TIMEOUT: {0}")]
    Timeout(String),

    /// Document parsed but failed structural validation.
    #[error("SCHEMA_INVALID: {0}")]
    SchemaInvalid(String),

    /// The page is behind an authentication wall.
    #[error("AUTHENTICATION_REQUIRED: {0}")]
    AuthenticationRequired(String),

    /// Storage read/write failure.
    #[error("IO_ERROR: {0}")]
    Io(String),

    /// The search surface was unreachable or returned an error.
    #[error("SEARCH_ERROR: {0}")]
    SearchError(String),

    /// Network-level fetch failure (distinct from a clean 404).
    #[error("FETCH_ERROR: {0}")]
    FetchError(String),

    /// No provider matched the discovery query.
    #[error("PROVIDER_NOT_FOUND: {0}")]
    ProviderNotFound(String),

    /// A provider page was found but no documentation link could be extracted.
    #[error("DOCS_URL_NOT_FOUND: {0}")]
    DocsUrlNotFound(String),

    /// Headless rendering failed.
    #[error("RENDER_FAILED: {0}")]
    RenderFailed(String),

    /// Every strategy ran and none produced endpoints.
    #[error("EXTRACTION_FAILED: no strategy produced endpoints ({})", format_attempts(.attempts))]
    ExtractionFailed { attempts: Vec<StrategyAttempt> },
}

impl Error {
    /// Whether this error must stop the acquisition pipeline instead of
    /// advancing to the next strategy.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::AuthenticationRequired(_) | Error::Io(_) | Error::InvalidInput(_) | Error::InvalidUrl(_))
    }

    /// Whether retrying later could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::SearchError(_) | Error::FetchError(_) | Error::RenderFailed(_))
    }

    /// Stable MCP error code for this variant.
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidInput(_) => -32602,
            Error::ExtractionFailed { .. } => -32000,
            Error::NotFound(_) => -32001,
            Error::Io(_) => -32002,
            Error::InvalidUrl(_) => -32003,
            Error::Expired(_) => -32004,
            Error::Timeout(_) => -32006,
            Error::SchemaInvalid(_) => -32007,
            Error::FetchError(_) => -32008,
            Error::AuthenticationRequired(_) => -32009,
            Error::SearchError(_) => -32010,
            Error::RenderFailed(_) => -32012,
            Error::ProviderNotFound(_) => -32013,
            Error::DocsUrlNotFound(_) => -32014,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        McpError { code: ErrorCode(err.code()), message: err.to_string().into(), data: None }
    }
}
