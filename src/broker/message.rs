//! Message shapes exchanged with external callers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::cookies::CookieRecord;

/// The only method the broker serves.
pub const GET_ALL_COOKIES: &str = "getAllCookies";

/// Value of `sorry` in the rejection response.
pub const NO_GO: &str = "no_go";

/// Identity of the external application that sent a message.
///
/// Supplied by the host at delivery time and trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageSender {
    id: String,
}

impl MessageSender {
    /// Creates a sender from its host-assigned id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Returns the sender id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Response body delivered to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BrokerResponse {
    /// Result of `getAllCookies`, possibly empty.
    Cookies {
        /// Permitted cookies in query order.
        cookies: Vec<CookieRecord>,
    },
    /// Soft rejection of any other request.
    Rejected {
        /// Always [`NO_GO`].
        sorry: String,
    },
}

impl BrokerResponse {
    /// Wraps a cookie list.
    #[must_use]
    pub fn cookies(cookies: Vec<CookieRecord>) -> Self {
        Self::Cookies { cookies }
    }

    /// The `{ cookies: [] }` response.
    #[must_use]
    pub fn no_cookies() -> Self {
        Self::Cookies {
            cookies: Vec::new(),
        }
    }

    /// The `{ sorry: "no_go" }` response.
    #[must_use]
    pub fn no_go() -> Self {
        Self::Rejected {
            sorry: NO_GO.to_string(),
        }
    }
}

/// Whether the response channel must stay open after the handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelDisposition {
    /// A response was already sent; the channel may close.
    Closed,
    /// A response will be sent later from a background task.
    KeepOpen,
}

/// One-shot callback that delivers the response to the caller.
///
/// Sending consumes the responder, so a caller can never be answered twice.
/// Dropping it unsent closes the caller's channel without a reply.
pub struct Responder {
    deliver: Box<dyn FnOnce(BrokerResponse) + Send>,
}

impl Responder {
    /// Creates a responder from a delivery callback.
    pub fn new(deliver: impl FnOnce(BrokerResponse) + Send + 'static) -> Self {
        Self {
            deliver: Box::new(deliver),
        }
    }

    /// Creates a responder paired with a receiver.
    ///
    /// The receiver resolves to an error if the responder is dropped unsent.
    #[must_use]
    pub fn channel() -> (Self, oneshot::Receiver<BrokerResponse>) {
        let (tx, rx) = oneshot::channel();
        let responder = Self::new(move |response| {
            // Receiver gone means the caller stopped listening.
            let _ = tx.send(response);
        });
        (responder, rx)
    }

    /// Delivers the response.
    pub fn send(self, response: BrokerResponse) {
        (self.deliver)(response);
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder").finish_non_exhaustive()
    }
}

/// Returns the requested method, if the request names one as a string.
///
/// An absent or falsy request (`null`, `false`, `0`, `""`) is read as `{}`.
#[must_use]
pub fn requested_method(request: Option<&Value>) -> Option<&str> {
    request
        .filter(|request| is_truthy(request))
        .and_then(|request| request.get("method"))
        .and_then(Value::as_str)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
