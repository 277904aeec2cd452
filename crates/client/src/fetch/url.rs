//! URL canonicalization.
//!
//! Pages are stored under a digest of the canonical URL, so two spellings of
//! the same address share one cache entry.

use lessonlens_core::Error;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

/// Canonicalize a URL string.
///
/// Leading/trailing whitespace is trimmed, a missing scheme becomes
/// `https://`, the host is lowercased and the fragment dropped. The query
/// string is kept as given.
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_scheme = match trimmed.contains("://") {
        true => trimmed.to_string(),
        false => format!("https://{trimmed}"),
    };

    let mut parsed = url::Url::parse(&with_scheme).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    let host = parsed.host_str().map(str::to_lowercase);
    if let Some(host) = host {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Lowercased file extension of the last path segment, if any.
pub fn path_extension(url: &url::Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
