//! URL canonicalization, origin derivation, and target classification.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string for consistent fetching and caching.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(mut host) = parsed.host_str() {
        let h = host.to_lowercase();
        host = h.as_str();
        parsed
            .set_host(Some(host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// The origin (`scheme://host[:port]/`) of a URL, with path and query dropped.
pub fn origin_of(url: &url::Url) -> Result<url::Url, UrlError> {
    let host = url.host_str().ok_or_else(|| UrlError::InvalidUrl(format!("{url} has no host")))?;
    let origin = match url.port() {
        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
        None => format!("{}://{}/", url.scheme(), host),
    };
    url::Url::parse(&origin).map_err(|e| UrlError::InvalidUrl(e.to_string()))
}

/// Whether user input names a URL rather than a provider.
///
/// Anything with a scheme, a dot, or a slash is treated as a URL;
/// bare words such as `stripe` or `open weather` are provider names.
pub fn is_url_like(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.contains("://") || trimmed.contains('/') || (trimmed.contains('.') && !trimmed.contains(char::is_whitespace))
}
