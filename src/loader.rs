//! Document loading from various sources.
//!
//! Handles JSON and YAML documents from files, strings, and HTTP URLs.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::ResolveError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Guess the format from a path or URL extension; anything other than
    /// `.yaml` / `.yml` is treated as JSON.
    pub fn from_source(source: &str) -> Self {
        let lower = source.to_ascii_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            DocumentFormat::Yaml
        } else {
            DocumentFormat::Json
        }
    }

    /// Whether a path has one of the supported document extensions.
    pub fn is_document_path(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e, "json" | "yaml" | "yml"))
            .unwrap_or(false)
    }
}

/// Load a document from a file path.
///
/// # Errors
///
/// Returns `ResolveError::FileNotFound` if the file doesn't exist, or
/// `InvalidJson` / `InvalidYaml` if it can't be parsed.
pub fn load_document(path: &Path) -> Result<Value, ResolveError> {
    if !path.exists() {
        return Err(ResolveError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ResolveError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "loaded document");
    let format = DocumentFormat::from_source(&path.to_string_lossy());
    load_document_str(&content, format)
}

/// Load a document from a string in the given format.
///
/// # Errors
///
/// Returns `InvalidJson` or `InvalidYaml` if the content can't be parsed.
pub fn load_document_str(content: &str, format: DocumentFormat) -> Result<Value, ResolveError> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(content).map_err(|source| ResolveError::InvalidJson { source })
        }
        DocumentFormat::Yaml => {
            // Go through serde_yaml::Value so non-string keys (e.g. `200:`)
            // become JSON object keys.
            let yaml: serde_yaml::Value = serde_yaml::from_str(content)
                .map_err(|source| ResolveError::InvalidYaml { source })?;
            serde_json::to_value(yaml).map_err(|source| ResolveError::InvalidJson { source })
        }
    }
}

/// Load a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `ResolveError::NetworkError` if the request fails, or a parse
/// error if the response body isn't a valid document.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, ResolveError> {
    let network_error = |source: reqwest::Error| ResolveError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let body = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network_error)?;

    debug!(url, "fetched document");
    load_document_str(&body, DocumentFormat::from_source(url))
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a document from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn load_document_auto(source: &str) -> Result<Value, ResolveError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(ResolveError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}
