//! Administrator whitelist policy.
//!
//! The policy is a JSON document with a single `whitelist` array. Each entry
//! grants one caller (`appId`) one cookie query shape (`domain` plus optional
//! `name`, `path` and `url`). Entries are applied one at a time, never in
//! conjunction, and an entry without a `domain` grants nothing.
//!
//! Decoding is deliberately lenient: the store hands back whatever JSON an
//! administrator wrote, and anything that is not a well-formed entry simply
//! grants no cookies.

mod error;
mod store;

pub use error::PolicyError;
pub use store::{FilePolicyStore, PolicyStore, StaticPolicyStore};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::cookies::CookieQuery;

/// One permitted cookie-query shape for one caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterEntry {
    /// Identity of the permitted caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// Primary match key. Entries without it are inert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Restricts the query to cookies with this exact name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Restricts the query to cookies with this exact path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Restricts the query to cookies that would be sent to this URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl FilterEntry {
    /// Creates an entry granting `app_id` the cookies of `domain`.
    #[must_use]
    pub fn new(app_id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
            domain: Some(domain.into()),
            ..Self::default()
        }
    }

    /// Narrows the entry to a cookie name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Narrows the entry to a cookie path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Narrows the entry to cookies sent to a URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Returns true if this entry was written for `app_id`.
    #[must_use]
    pub fn permits(&self, app_id: &str) -> bool {
        self.app_id.as_deref() == Some(app_id)
    }

    /// Builds the cookie store query for this entry.
    ///
    /// Returns `None` when the entry has no (or an empty) `domain`. Empty
    /// optional fields are left out of the descriptor so they do not narrow
    /// the store query.
    #[must_use]
    pub fn to_query(&self) -> Option<CookieQuery> {
        let domain = non_empty(self.domain.as_ref())?;
        Some(CookieQuery {
            domain: domain.to_string(),
            name: non_empty(self.name.as_ref()).map(str::to_string),
            path: non_empty(self.path.as_ref()).map(str::to_string),
            url: non_empty(self.url.as_ref()).map(str::to_string),
        })
    }

    fn from_object(index: usize, object: &Map<String, Value>) -> Self {
        Self {
            app_id: string_field(index, object, "appId"),
            domain: string_field(index, object, "domain"),
            name: string_field(index, object, "name"),
            path: string_field(index, object, "path"),
            url: string_field(index, object, "url"),
        }
    }
}

/// Policy configuration as fetched from the policy store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct PolicyConfiguration {
    /// Ordered filter entries.
    pub whitelist: Vec<FilterEntry>,
}

impl PolicyConfiguration {
    /// Creates a configuration from a list of entries.
    #[must_use]
    pub fn new(whitelist: Vec<FilterEntry>) -> Self {
        Self { whitelist }
    }

    /// Decodes a configuration from an arbitrary JSON value.
    ///
    /// A missing or non-array `whitelist` decodes to an empty whitelist.
    /// Entries that are not objects are dropped; fields that are not strings
    /// are treated as absent.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(raw) = value.get("whitelist") else {
            return Self::default();
        };
        let Some(entries) = raw.as_array() else {
            warn!("policy whitelist is not an array; granting no cookies");
            return Self::default();
        };

        let whitelist = entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match entry.as_object() {
                Some(object) => Some(FilterEntry::from_object(index, object)),
                None => {
                    warn!(entry = index, "skipping whitelist entry that is not an object");
                    None
                }
            })
            .collect();

        Self { whitelist }
    }

    /// Returns the entries permitting `app_id`, in whitelist order.
    pub fn entries_for<'a>(&'a self, app_id: &'a str) -> impl Iterator<Item = &'a FilterEntry> {
        self.whitelist.iter().filter(move |entry| entry.permits(app_id))
    }

    /// Returns true if the whitelist has no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.whitelist.is_empty()
    }
}

impl From<Value> for PolicyConfiguration {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

fn string_field(index: usize, object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) => Some(value.clone()),
        Some(_) => {
            warn!(entry = index, field = key, "ignoring non-string whitelist field");
            None
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_reads_entries_in_order() {
        let config = PolicyConfiguration::from_value(&json!({
            "whitelist": [
                { "appId": "app-a", "domain": "a.com" },
                { "appId": "app-b", "domain": "b.com", "name": "session" }
            ]
        }));
        assert_eq!(config.whitelist.len(), 2);
        assert_eq!(config.whitelist[0], FilterEntry::new("app-a", "a.com"));
        assert_eq!(
            config.whitelist[1],
            FilterEntry::new("app-b", "b.com").with_name("session")
        );
    }

    #[test]
    fn test_from_value_missing_whitelist_is_empty() {
        assert!(PolicyConfiguration::from_value(&json!({})).is_empty());
        assert!(PolicyConfiguration::from_value(&Value::Null).is_empty());
    }

    #[test]
    fn test_from_value_non_array_whitelist_is_empty() {
        let config = PolicyConfiguration::from_value(&json!({ "whitelist": "app-a" }));
        assert!(config.is_empty());
    }

    #[test]
    fn test_from_value_skips_non_object_entries() {
        let config = PolicyConfiguration::from_value(&json!({
            "whitelist": [null, 7, { "appId": "app-a", "domain": "a.com" }]
        }));
        assert_eq!(config.whitelist, vec![FilterEntry::new("app-a", "a.com")]);
    }

    #[test]
    fn test_from_value_non_string_fields_are_absent() {
        let config = PolicyConfiguration::from_value(&json!({
            "whitelist": [{ "appId": "app-a", "domain": 42, "name": true }]
        }));
        let entry = &config.whitelist[0];
        assert!(entry.domain.is_none());
        assert!(entry.name.is_none());
        assert!(entry.to_query().is_none());
    }

    #[test]
    fn test_deserialize_goes_through_lenient_decoder() {
        let config: PolicyConfiguration =
            serde_json::from_str(r#"{"whitelist": {"not": "a list"}}"#).unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_entries_for_matches_exact_app_id() {
        let config = PolicyConfiguration::new(vec![
            FilterEntry::new("app-a", "a.com"),
            FilterEntry::new("app-b", "b.com"),
            FilterEntry::new("app-a", "c.com"),
        ]);
        let domains: Vec<_> = config
            .entries_for("app-a")
            .filter_map(|entry| entry.domain.as_deref())
            .collect();
        assert_eq!(domains, vec!["a.com", "c.com"]);
        assert_eq!(config.entries_for("APP-A").count(), 0);
    }

    #[test]
    fn test_entry_without_app_id_permits_nobody() {
        let entry = FilterEntry {
            domain: Some("a.com".to_string()),
            ..FilterEntry::default()
        };
        assert!(!entry.permits(""));
        assert!(!entry.permits("app-a"));
    }

    #[test]
    fn test_to_query_includes_only_present_fields() {
        let query = FilterEntry::new("app-a", "b.com")
            .with_name("session")
            .to_query()
            .unwrap();
        assert_eq!(query.domain, "b.com");
        assert_eq!(query.name.as_deref(), Some("session"));
        assert!(query.path.is_none());
        assert!(query.url.is_none());
    }

    #[test]
    fn test_to_query_treats_empty_strings_as_absent() {
        let mut entry = FilterEntry::new("app-a", "");
        assert!(entry.to_query().is_none());

        entry.domain = Some("a.com".to_string());
        entry.path = Some(String::new());
        let query = entry.to_query().unwrap();
        assert!(query.path.is_none());
    }
}
