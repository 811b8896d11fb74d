//! Error types for the policy module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching the policy configuration.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy file exists but could not be read.
    #[error("failed to read policy file {path}: {source}")]
    Io {
        /// The policy file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The policy file is not valid JSON.
    #[error("policy file {path} is not valid JSON: {source}")]
    Parse {
        /// The policy file path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A custom policy backend could not produce a configuration.
    #[error("policy store unavailable: {0}")]
    Unavailable(String),
}
