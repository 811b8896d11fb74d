//! In-memory cookie store.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use url::Url;

use super::matching::matches_query;
use super::{CookieQuery, CookieRecord, CookieStore, CookieStoreError};

/// Cookie store holding its records in memory.
///
/// Cookies are keyed by `(name, domain, path)`; inserting a cookie with an
/// existing key replaces it in place. Query results are ordered by
/// descending path length, then by insertion order.
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    cookies: RwLock<Vec<CookieRecord>>,
}

impl MemoryCookieStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from records, applying the same replacement rule as
    /// [`insert`](Self::insert).
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = CookieRecord>) -> Self {
        let mut cookies: Vec<CookieRecord> = Vec::new();
        for record in records {
            upsert(&mut cookies, record);
        }
        Self {
            cookies: RwLock::new(cookies),
        }
    }

    /// Adds or replaces a cookie.
    pub async fn insert(&self, record: CookieRecord) {
        let mut cookies = self.cookies.write().await;
        upsert(&mut cookies, record);
    }

    /// Returns the number of stored cookies.
    pub async fn len(&self) -> usize {
        self.cookies.read().await.len()
    }

    /// Returns true if the store holds no cookies.
    pub async fn is_empty(&self) -> bool {
        self.cookies.read().await.is_empty()
    }
}

fn upsert(cookies: &mut Vec<CookieRecord>, record: CookieRecord) {
    let existing = cookies.iter_mut().find(|cookie| {
        cookie.name == record.name
            && cookie.path == record.path
            && cookie.normalized_domain() == record.normalized_domain()
            && cookie.host_only == record.host_only
    });
    match existing {
        Some(slot) => *slot = record,
        None => cookies.push(record),
    }
}

#[async_trait]
impl CookieStore for MemoryCookieStore {
    #[instrument(level = "debug", skip(self), fields(domain = %query.domain))]
    async fn get_all(&self, query: &CookieQuery) -> Result<Vec<CookieRecord>, CookieStoreError> {
        let url = query
            .url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|source| CookieStoreError::InvalidUrl {
                    url: raw.to_string(),
                    source,
                })
            })
            .transpose()?;

        let mut matched: Vec<CookieRecord> = self
            .cookies
            .read()
            .await
            .iter()
            .filter(|cookie| matches_query(cookie, query, url.as_ref()))
            .cloned()
            .collect();
        // Stable sort keeps insertion order within equal path lengths.
        matched.sort_by(|a, b| b.path.len().cmp(&a.path.len()));

        debug!(matched = matched.len(), "cookie query complete");
        Ok(matched)
    }
}
