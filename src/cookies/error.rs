//! Error types for the cookies module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors a cookie store can report for a query.
#[derive(Debug, Error)]
pub enum CookieStoreError {
    /// The query's `url` field could not be parsed.
    #[error("invalid cookie query url '{url}': {source}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The backing store could not answer.
    #[error("cookie store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while importing a cookie export.
#[derive(Debug, Error)]
pub enum CookieImportError {
    /// Input was empty.
    #[error("cookie input is empty")]
    EmptyInput,

    /// A line in a Netscape cookie file has an invalid format.
    #[error("line {line_number}: {reason} (got: {content})")]
    InvalidLine {
        /// 1-based line number in the cookie file.
        line_number: usize,
        /// The offending line content (truncated, with value redacted).
        content: String,
        /// Description of what was wrong.
        reason: String,
    },

    /// No valid cookies found in a non-empty Netscape file.
    #[error("no valid cookies found in file ({malformed_count} lines failed to parse)")]
    NoCookiesFound {
        /// Number of malformed lines encountered.
        malformed_count: usize,
    },

    /// JSON export could not be parsed.
    #[error("invalid cookie JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON export is neither an array nor an object with a `cookies` array.
    #[error("cookie JSON must be an array or an object with a \"cookies\" array")]
    UnexpectedJsonShape,

    /// I/O error reading the cookie source.
    #[error("failed to read cookie file {path}: {source}")]
    Io {
        /// The cookie file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Reading lines from an in-memory reader failed.
    #[error("failed to read cookie input: {0}")]
    Read(#[from] std::io::Error),
}
