//! Policy configuration stores.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{PolicyConfiguration, PolicyError};

/// Read-only source of the current policy configuration.
///
/// The broker calls [`PolicyStore::load`] once per request and never caches
/// the result, so a store should always return its freshest view.
///
/// # Object Safety
///
/// This trait uses `async_trait` so the broker can hold an
/// `Arc<dyn PolicyStore>`.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Fetches the current configuration.
    async fn load(&self) -> Result<PolicyConfiguration, PolicyError>;
}

/// Policy store that always returns the same configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicyStore {
    configuration: PolicyConfiguration,
}

impl StaticPolicyStore {
    /// Creates a store around a fixed configuration.
    #[must_use]
    pub fn new(configuration: PolicyConfiguration) -> Self {
        Self { configuration }
    }

    /// Creates a store with no whitelist, as when no administrator policy exists.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PolicyStore for StaticPolicyStore {
    async fn load(&self) -> Result<PolicyConfiguration, PolicyError> {
        Ok(self.configuration.clone())
    }
}

/// Policy store backed by a managed-policy JSON file.
///
/// The file is re-read on every [`load`](PolicyStore::load), so edits made by
/// an administrator take effect on the next request. A missing or blank file
/// means no policy was ever configured and yields an empty whitelist.
#[derive(Debug, Clone)]
pub struct FilePolicyStore {
    path: PathBuf,
}

impl FilePolicyStore {
    /// Creates a store reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the policy file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PolicyStore for FilePolicyStore {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<PolicyConfiguration, PolicyError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                debug!("policy file not found; using empty whitelist");
                return Ok(PolicyConfiguration::default());
            }
            Err(source) => {
                return Err(PolicyError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if raw.trim().is_empty() {
            debug!("policy file is blank; using empty whitelist");
            return Ok(PolicyConfiguration::default());
        }

        let value: Value = serde_json::from_str(&raw).map_err(|source| PolicyError::Parse {
            path: self.path.clone(),
            source,
        })?;
        let configuration = PolicyConfiguration::from_value(&value);
        debug!(entries = configuration.whitelist.len(), "loaded policy");
        Ok(configuration)
    }
}
