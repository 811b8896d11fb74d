//! Cookie Broker Core Library
//!
//! This library provides a policy-gated broker that hands cookie data to
//! external applications. An administrator-supplied whitelist decides which
//! cookie queries each caller identity may run; the broker fans those queries
//! out against a cookie store, merges the results and answers the caller.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`broker`] - Request dispatch and the resolve/collect pipeline
//! - [`policy`] - Whitelist configuration model and policy stores
//! - [`cookies`] - Cookie records, query descriptors and cookie stores
//! - [`host`] - Message host that frames envelopes over a byte stream

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod broker;
pub mod cookies;
pub mod host;
pub mod policy;

// Re-export commonly used types
pub use broker::{
    BrokerError, BrokerResponse, ChannelDisposition, CookieBroker, EXCLUDED_DOMAIN_MARKER,
    GET_ALL_COOKIES, GetAllCookiesParams, MessageSender, Responder, is_excluded_domain,
};
pub use cookies::{
    CookieImportError, CookieQuery, CookieRecord, CookieStore, CookieStoreError, ExportFormat,
    ImportedCookies, MemoryCookieStore, import_cookie_file, parse_cookie_export,
};
pub use host::{Framing, HostError, HostSummary, MessageHost};
pub use policy::{
    FilePolicyStore, FilterEntry, PolicyConfiguration, PolicyError, PolicyStore,
    StaticPolicyStore,
};
