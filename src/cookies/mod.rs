//! Cookie records, query descriptors and cookie stores.
//!
//! # Architecture
//!
//! - [`CookieRecord`] - One stored cookie, serialized in the browser's camelCase shape
//! - [`CookieQuery`] - Descriptor for a single `getAll`-style lookup
//! - [`CookieStore`] - Async trait the broker queries once per filter entry
//! - [`MemoryCookieStore`] - In-memory store with browser matching rules
//! - [`parse_cookie_export`] - Netscape/JSON export import into records

mod error;
mod import;
mod matching;
mod memory;
mod netscape;

pub use error::{CookieImportError, CookieStoreError};
pub use import::{ExportFormat, ImportedCookies, import_cookie_file, parse_cookie_export};
pub use memory::MemoryCookieStore;
pub use netscape::{NetscapeParseResult, parse_netscape_cookies};

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Store id reported for cookies in the default cookie store.
pub const DEFAULT_STORE_ID: &str = "0";

/// A single cookie as returned by a cookie store.
///
/// The value field is intentionally redacted in Debug output to prevent
/// accidental logging of sensitive cookie data.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    /// Cookie name.
    pub name: String,
    /// Cookie value (sensitive — never log).
    value: String,
    /// The domain the cookie belongs to (e.g., `.example.com`).
    pub domain: String,
    /// True if the cookie is only sent to the exact host in `domain`.
    #[serde(default)]
    pub host_only: bool,
    /// The URL path scope for the cookie.
    #[serde(default = "default_path")]
    pub path: String,
    /// Whether the cookie should only be sent over HTTPS.
    #[serde(default)]
    pub secure: bool,
    /// Whether the cookie is hidden from page scripts.
    #[serde(default)]
    pub http_only: bool,
    /// True for cookies without an expiry.
    #[serde(default)]
    pub session: bool,
    /// Expiry as seconds since the Unix epoch. Absent for session cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<f64>,
    /// Id of the cookie store holding this cookie.
    #[serde(default = "default_store_id")]
    pub store_id: String,
}

impl CookieRecord {
    /// Creates a session cookie scoped to `/`.
    ///
    /// A `domain` with a leading dot is a domain cookie; otherwise the cookie
    /// is host-only.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        let domain = domain.into();
        Self {
            name: name.into(),
            value: value.into(),
            host_only: !domain.starts_with('.'),
            domain,
            path: default_path(),
            secure: false,
            http_only: false,
            session: true,
            expiration_date: None,
            store_id: default_store_id(),
        }
    }

    /// Sets the cookie path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the secure flag.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the http-only flag.
    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Gives the cookie an expiry, making it persistent.
    #[must_use]
    pub fn with_expiration(mut self, expires_at: f64) -> Self {
        self.expiration_date = Some(expires_at);
        self.session = false;
        self
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive — avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the domain without its leading dot, lowercased.
    #[must_use]
    pub fn normalized_domain(&self) -> String {
        self.domain.trim_start_matches('.').to_ascii_lowercase()
    }
}

// Custom Debug impl that redacts the cookie value.
impl fmt::Debug for CookieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieRecord")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("host_only", &self.host_only)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("session", &self.session)
            .field("expiration_date", &self.expiration_date)
            .field("store_id", &self.store_id)
            .finish()
    }
}

fn default_path() -> String {
    "/".to_string()
}

fn default_store_id() -> String {
    DEFAULT_STORE_ID.to_string()
}

/// Descriptor for one cookie store lookup.
///
/// Only `domain` is mandatory; every other field narrows the lookup and is
/// left out of the serialized form when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CookieQuery {
    /// Cookies whose domain equals or is a subdomain of this one.
    pub domain: String,
    /// Cookies with exactly this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Cookies with exactly this path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Cookies that would be sent with a request to this URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl CookieQuery {
    /// Creates a query matching every cookie of `domain`.
    #[must_use]
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Narrows the query to a cookie name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Narrows the query to a cookie path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Narrows the query to cookies sent to a URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Source of cookie records.
///
/// A query that matches nothing yields an empty list, never an error. Errors
/// are reserved for store-level failures.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Arc<dyn CookieStore>`.
#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Returns every cookie matching `query`.
    async fn get_all(&self, query: &CookieQuery) -> Result<Vec<CookieRecord>, CookieStoreError>;
}
