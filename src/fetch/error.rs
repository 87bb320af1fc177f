//! Error types for artifact retrieval.
//!
//! Variants carry the URL or path context the underlying errors lack;
//! helper constructors keep call sites short.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching and validating a PDF.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if present (for 429 responses).
        retry_after: Option<String>,
    },

    /// The response is not a PDF: neither the declared content type nor the
    /// URL extension indicates one. Nothing is written in this case.
    #[error("response for {url} is not a PDF (content-type: {content_type})")]
    NotPdf {
        /// The URL whose response was rejected.
        url: String,
        /// The declared content type, or `<none>`.
        content_type: String,
    },

    /// The written file does not start with the PDF magic signature.
    /// Upstream providers intermittently serve HTML error pages with a 200
    /// status and a PDF content type; the file has been deleted.
    #[error("payload written to {path} is not a valid PDF")]
    InvalidPayload {
        /// The path the rejected payload was written to.
        path: PathBuf,
    },

    /// File system error during download (create file, write, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error with a Retry-After header value.
    pub fn http_status_with_retry_after(
        url: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after,
        }
    }

    /// Creates a not-a-PDF rejection.
    pub fn not_pdf(url: impl Into<String>, content_type: Option<&str>) -> Self {
        Self::NotPdf {
            url: url.into(),
            content_type: content_type.unwrap_or("<none>").to_string(),
        }
    }

    /// Creates an invalid-payload rejection.
    pub fn invalid_payload(path: impl Into<PathBuf>) -> Self {
        Self::InvalidPayload { path: path.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display_includes_status_and_url() {
        let error = FetchError::http_status("https://example.com/p.pdf", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "expected '404' in: {msg}");
        assert!(msg.contains("example.com/p.pdf"), "expected URL in: {msg}");
    }

    #[test]
    fn test_not_pdf_display_includes_content_type() {
        let error = FetchError::not_pdf("https://example.com/x", Some("text/html"));
        let msg = error.to_string();
        assert!(msg.contains("text/html"), "expected content type in: {msg}");
    }

    #[test]
    fn test_not_pdf_missing_content_type_uses_placeholder() {
        let error = FetchError::not_pdf("https://example.com/x", None);
        assert!(error.to_string().contains("<none>"));
    }

    #[test]
    fn test_invalid_payload_display_includes_path() {
        let error = FetchError::invalid_payload("/tmp/bad.pdf");
        assert!(error.to_string().contains("/tmp/bad.pdf"));
    }

    #[test]
    fn test_io_display_includes_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = FetchError::io(PathBuf::from("/tmp/test.pdf"), io_error);
        assert!(error.to_string().contains("/tmp/test.pdf"));
    }
}
