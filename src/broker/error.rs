//! Error types for the broker pipeline.

use thiserror::Error;

use crate::cookies::CookieStoreError;
use crate::policy::PolicyError;

/// Failures that abort a `getAllCookies` pipeline.
///
/// None of these reach the caller as a payload: the responder is dropped and
/// the caller sees its response channel close.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The policy configuration could not be fetched.
    #[error("failed to load policy configuration: {0}")]
    Policy(#[from] PolicyError),

    /// One of the fanned-out cookie queries failed.
    #[error("cookie query for domain {domain} failed: {source}")]
    CookieQuery {
        /// Domain of the failing query.
        domain: String,
        /// The underlying store error.
        #[source]
        source: CookieStoreError,
    },
}
