//! Custom error types for igf.
//!
//! Provides structured error handling with detailed context for better
//! diagnostics and user experience.

use crate::model::ListKind;
use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for igf operations.
///
/// Each variant provides specific context about what went wrong,
/// enabling better error messages and programmatic error handling.
#[derive(Error, Debug)]
pub enum IgfError {
    // =========================================================================
    // Session Errors
    // =========================================================================
    /// No authenticated Instagram session could be discovered.
    #[error(
        "No Instagram session found. Log into instagram.com in your browser and export its cookies, then pass the file with --cookies."
    )]
    IdentityUnavailable,

    /// Cookie source exists but could not be read.
    #[error("Failed to read cookie file '{path}': {source}")]
    CookieSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Fetch Errors
    // =========================================================================
    /// The API answered a page request with a non-success status.
    #[error("Fetching {kind} failed: HTTP status {status}")]
    HttpStatus { kind: ListKind, status: u16 },

    /// A page request failed at the transport level.
    #[error("Fetching {kind} failed: {reason}")]
    PageFetch { kind: ListKind, reason: String },

    /// The request/reply channel to the API bridge is gone.
    #[error("API bridge is no longer running")]
    BridgeClosed,

    /// The API answered with a body that could not be parsed at all.
    #[error("Malformed API response: {reason}")]
    MalformedResponse { reason: String },

    /// The pagination safety cap was reached before the server ended the
    /// collection.
    #[error(
        "Stopped fetching {kind} after {pages} pages without reaching the end of the list. Raise api.max_pages (or set it to 0) to allow longer fetches."
    )]
    CollectionTooLarge { kind: ListKind, pages: usize },

    /// A second analysis was requested while one is already running.
    #[error("An analysis is already in progress")]
    AnalysisInProgress,

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Key/value store operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A stored value could not be decoded.
    #[error("Stored value for '{key}' is not valid JSON: {reason}")]
    CorruptStoredValue { key: &'static str, reason: String },

    // =========================================================================
    // IO / HTTP Errors
    // =========================================================================
    /// File read/write error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file parsing error.
    #[error("Invalid configuration in '{path}': {reason}")]
    Config { path: PathBuf, reason: String },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Catch-all for other errors with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Wrapped anyhow error for gradual migration.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for igf operations.
pub type Result<T> = std::result::Result<T, IgfError>;

impl IgfError {
    /// Create a page fetch error.
    pub fn page_fetch(kind: ListKind, reason: impl Into<String>) -> Self {
        Self::PageFetch {
            kind,
            reason: reason.into(),
        }
    }

    /// Create a malformed response error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error with additional context.
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Check if this error is recoverable (user can fix it).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::IdentityUnavailable
                | Self::CookieSource { .. }
                | Self::CollectionTooLarge { .. }
                | Self::AnalysisInProgress
                | Self::Config { .. }
        )
    }

    /// Check if this error means the session credentials are likely stale.
    #[must_use]
    pub const fn suggests_reauth(&self) -> bool {
        matches!(
            self,
            Self::IdentityUnavailable | Self::HttpStatus { status: 401 | 403, .. }
        )
    }

    /// Get a suggestion for how to fix this error, if applicable.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::IdentityUnavailable | Self::CookieSource { .. } => Some(
                "Log into instagram.com in your browser, export the cookies (Netscape format), and pass the file with --cookies.",
            ),
            Self::HttpStatus { status: 429, .. } => Some(
                "Instagram is rate limiting the session. Wait a few minutes, or raise api.page_delay_ms, then re-run the analysis.",
            ),
            Self::HttpStatus {
                status: 401 | 403, ..
            } => Some("The exported session looks stale. Re-export your browser cookies."),
            Self::CollectionTooLarge { .. } => {
                Some("Raise api.max_pages in the config, or set it to 0 to disable the cap.")
            }
            Self::AnalysisInProgress => {
                Some("Wait for the running analysis to finish, then re-run.")
            }
            _ => None,
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped with additional context.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped with additional context.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| IgfError::with_context(context, e))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| IgfError::with_context(f(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IgfError::HttpStatus {
            kind: ListKind::Followers,
            status: 429,
        };
        assert!(err.to_string().contains("followers"));
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn test_error_suggestions() {
        let err = IgfError::IdentityUnavailable;
        assert!(err.suggestion().is_some());
        assert!(err.is_recoverable());
        assert!(err.suggests_reauth());
    }

    #[test]
    fn test_rate_limit_suggestion() {
        let err = IgfError::HttpStatus {
            kind: ListKind::Following,
            status: 429,
        };
        assert!(err.suggestion().unwrap().contains("rate limiting"));
        assert!(!err.suggests_reauth());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let igf_err: IgfError = io_err.into();
        assert!(matches!(igf_err, IgfError::Io(_)));
    }

    #[test]
    fn test_from_rusqlite_error() {
        // This test verifies the From impl exists
        fn accepts_igf_error(_: IgfError) {}
        let sqlite_err = rusqlite::Error::InvalidQuery;
        accepts_igf_error(sqlite_err.into());
    }

    #[test]
    fn test_result_ext_context() {
        let r: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("underlying failure"));
        let wrapped = r.context("while probing cookies");
        let err = wrapped.unwrap_err();
        assert!(err.to_string().contains("while probing cookies"));
    }
}
