//! Cookie access broker.
//!
//! Answers `getAllCookies` requests from external applications. For each
//! request the broker fetches the current policy, builds one cookie query per
//! whitelist entry granted to the caller, runs the queries concurrently,
//! concatenates their results in query order and withholds the excluded
//! domain family before answering.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cookie_broker_core::{
//!     CookieBroker, MemoryCookieStore, MessageSender, Responder, StaticPolicyStore,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let broker = CookieBroker::new(
//!     Arc::new(StaticPolicyStore::unconfigured()),
//!     Arc::new(MemoryCookieStore::new()),
//! );
//!
//! let request = serde_json::json!({ "method": "getAllCookies" });
//! let (responder, response) = Responder::channel();
//! broker.handle_external_message(Some(&request), &MessageSender::new("app-id"), responder);
//! println!("{:?}", response.await?);
//! # Ok(())
//! # }
//! ```

mod error;
mod exclusion;
mod message;

pub use error::BrokerError;
pub use exclusion::{EXCLUDED_DOMAIN_MARKER, is_excluded_domain};
pub use message::{
    BrokerResponse, ChannelDisposition, GET_ALL_COOKIES, MessageSender, NO_GO, Responder,
    requested_method,
};

use std::sync::Arc;

use futures_util::future::try_join_all;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::cookies::{CookieQuery, CookieRecord, CookieStore};
use crate::policy::{PolicyConfiguration, PolicyStore};

/// Inputs to [`CookieBroker::get_all_cookies`].
#[derive(Debug)]
pub struct GetAllCookiesParams {
    /// Identity of the calling application.
    pub app_id: String,
    /// Policy configuration fetched for this request.
    pub configuration: PolicyConfiguration,
    /// Receives the final response.
    pub callback: Responder,
}

/// Policy-gated access to a cookie store.
///
/// Cloning is cheap; clones share the same stores. The broker itself holds no
/// per-request state, so any number of requests may be in flight at once.
#[derive(Clone)]
pub struct CookieBroker {
    policy_store: Arc<dyn PolicyStore>,
    cookie_store: Arc<dyn CookieStore>,
}

impl std::fmt::Debug for CookieBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieBroker").finish_non_exhaustive()
    }
}

impl CookieBroker {
    /// Creates a broker over a policy store and a cookie store.
    #[must_use]
    pub fn new(policy_store: Arc<dyn PolicyStore>, cookie_store: Arc<dyn CookieStore>) -> Self {
        Self {
            policy_store,
            cookie_store,
        }
    }

    /// Handles one inbound external message.
    ///
    /// Anything other than `getAllCookies` is answered with
    /// `{ sorry: "no_go" }` before this returns. A `getAllCookies` request is
    /// handed to a background task and [`ChannelDisposition::KeepOpen`] is
    /// returned; the task answers exactly once, or drops the responder if the
    /// policy fetch or a cookie query fails.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn handle_external_message(
        &self,
        request: Option<&Value>,
        sender: &MessageSender,
        responder: Responder,
    ) -> ChannelDisposition {
        if requested_method(request) != Some(GET_ALL_COOKIES) {
            debug!(app_id = %sender.id(), "rejecting unsupported request");
            responder.send(BrokerResponse::no_go());
            return ChannelDisposition::Closed;
        }

        let broker = self.clone();
        let app_id = sender.id().to_string();
        tokio::spawn(async move {
            if let Err(error) = broker.respond(app_id.clone(), responder).await {
                error!(app_id = %app_id, error = %error, "getAllCookies failed; no response sent");
            }
        });
        ChannelDisposition::KeepOpen
    }

    /// Fetches the policy and runs [`get_all_cookies`](Self::get_all_cookies).
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Policy`] if the policy store fails, or any error
    /// from [`get_all_cookies`](Self::get_all_cookies). The responder is
    /// dropped unsent in both cases.
    pub async fn respond(&self, app_id: String, responder: Responder) -> Result<(), BrokerError> {
        let configuration = self.policy_store.load().await?;
        self.get_all_cookies(GetAllCookiesParams {
            app_id,
            configuration,
            callback: responder,
        })
        .await
    }

    /// Resolves the caller's whitelist entries, collects their cookies and
    /// delivers `{ cookies: [...] }` through the callback.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::CookieQuery`] if any cookie query fails. The
    /// callback is dropped without being invoked.
    pub async fn get_all_cookies(&self, params: GetAllCookiesParams) -> Result<(), BrokerError> {
        let GetAllCookiesParams {
            app_id,
            configuration,
            callback,
        } = params;
        let cookies = self.collect_cookies(&app_id, &configuration).await?;
        callback.send(BrokerResponse::cookies(cookies));
        Ok(())
    }

    /// Returns the cookies `app_id` may see under `configuration`.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::CookieQuery`] if any cookie query fails; the
    /// results of the other queries are discarded.
    #[instrument(level = "debug", skip(self, configuration))]
    pub async fn collect_cookies(
        &self,
        app_id: &str,
        configuration: &PolicyConfiguration,
    ) -> Result<Vec<CookieRecord>, BrokerError> {
        let queries = build_queries(app_id, configuration);
        if queries.is_empty() {
            debug!(app_id, "no usable whitelist entries for caller");
            return Ok(Vec::new());
        }

        let lookups = queries.iter().map(|query| async move {
            self.cookie_store
                .get_all(query)
                .await
                .map_err(|source| BrokerError::CookieQuery {
                    domain: query.domain.clone(),
                    source,
                })
        });
        let results = try_join_all(lookups).await?;

        let matched: usize = results.iter().map(Vec::len).sum();
        let cookies: Vec<CookieRecord> = results
            .into_iter()
            .flatten()
            .filter(|cookie| !is_excluded_domain(&cookie.domain))
            .collect();

        info!(
            app_id,
            queries = queries.len(),
            matched,
            returned = cookies.len(),
            "Collected cookies"
        );
        Ok(cookies)
    }
}

/// Builds one query per whitelist entry granted to `app_id`, in whitelist order.
fn build_queries(app_id: &str, configuration: &PolicyConfiguration) -> Vec<CookieQuery> {
    configuration
        .entries_for(app_id)
        .filter_map(|entry| {
            let query = entry.to_query();
            if query.is_none() {
                debug!(app_id, "skipping whitelist entry without a domain");
            }
            query
        })
        .collect()
}
