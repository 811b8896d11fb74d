//! Cookie matching rules for `getAll`-style queries.
//!
//! Domain and path matching follow RFC 6265 §5.1.3 and §5.1.4.

use url::Url;

use super::{CookieQuery, CookieRecord};

/// Returns true if `cookie` satisfies every field present in `query`.
///
/// `url` is the already-parsed form of `query.url`.
pub(crate) fn matches_query(cookie: &CookieRecord, query: &CookieQuery, url: Option<&Url>) -> bool {
    if !domain_matches(&cookie.normalized_domain(), &query.domain) {
        return false;
    }
    if query.name.as_ref().is_some_and(|name| *name != cookie.name) {
        return false;
    }
    if query.path.as_ref().is_some_and(|path| *path != cookie.path) {
        return false;
    }
    url.is_none_or(|url| sendable_to(cookie, url))
}

/// True when `cookie_domain` equals `domain` or is one of its subdomains.
pub(crate) fn domain_matches(cookie_domain: &str, domain: &str) -> bool {
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    cookie_domain == domain
        || cookie_domain
            .strip_suffix(domain.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// True when the cookie path scope covers `request_path`.
pub(crate) fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if cookie_path == request_path {
        return true;
    }
    request_path.strip_prefix(cookie_path).is_some_and(|rest| {
        cookie_path.ends_with('/') || rest.starts_with('/')
    })
}

fn sendable_to(cookie: &CookieRecord, url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let cookie_domain = cookie.normalized_domain();

    let host_ok = if cookie.host_only {
        host == cookie_domain
    } else {
        domain_matches(&host, &cookie_domain)
    };
    if !host_ok {
        return false;
    }

    if cookie.secure && !matches!(url.scheme(), "https" | "wss") {
        return false;
    }

    path_matches(&cookie.path, url.path())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_domain_matches_exact_and_subdomains() {
        assert!(domain_matches("example.com", "example.com"));
        assert!(domain_matches("mail.example.com", "example.com"));
        assert!(domain_matches("example.com", ".Example.com"));
        assert!(!domain_matches("notexample.com", "example.com"));
        assert!(!domain_matches("example.com", "mail.example.com"));
        assert!(!domain_matches("example.com", ""));
    }

    #[test]
    fn test_path_matches_rfc_rules() {
        assert!(path_matches("/", "/anything"));
        assert!(path_matches("/docs", "/docs"));
        assert!(path_matches("/docs", "/docs/page"));
        assert!(path_matches("/docs/", "/docs/page"));
        assert!(!path_matches("/docs", "/docsearch"));
        assert!(!path_matches("/docs", "/"));
    }

    #[test]
    fn test_matches_query_domain_only() {
        let cookie = CookieRecord::new("a", "1", ".example.com");
        assert!(matches_query(&cookie, &CookieQuery::for_domain("example.com"), None));
        assert!(!matches_query(&cookie, &CookieQuery::for_domain("other.com"), None));
    }

    #[test]
    fn test_matches_query_name_and_path_are_exact() {
        let cookie = CookieRecord::new("session", "1", "b.com").with_path("/app");
        let base = CookieQuery::for_domain("b.com");
        assert!(matches_query(&cookie, &base.clone().with_name("session"), None));
        assert!(!matches_query(&cookie, &base.clone().with_name("Session"), None));
        assert!(matches_query(&cookie, &base.clone().with_path("/app"), None));
        assert!(!matches_query(&cookie, &base.with_path("/"), None));
    }

    #[test]
    fn test_matches_query_url_host_only() {
        let cookie = CookieRecord::new("a", "1", "example.com");
        let query = CookieQuery::for_domain("example.com");
        assert!(matches_query(&cookie, &query, Some(&url("https://example.com/"))));
        assert!(!matches_query(&cookie, &query, Some(&url("https://www.example.com/"))));
    }

    #[test]
    fn test_matches_query_url_domain_cookie_reaches_subdomain() {
        let cookie = CookieRecord::new("a", "1", ".example.com");
        let query = CookieQuery::for_domain("example.com");
        assert!(matches_query(&cookie, &query, Some(&url("http://www.example.com/x"))));
    }

    #[test]
    fn test_matches_query_url_secure_requires_https() {
        let cookie = CookieRecord::new("a", "1", ".example.com").with_secure(true);
        let query = CookieQuery::for_domain("example.com");
        assert!(!matches_query(&cookie, &query, Some(&url("http://example.com/"))));
        assert!(matches_query(&cookie, &query, Some(&url("https://example.com/"))));
    }

    #[test]
    fn test_matches_query_url_path_scope() {
        let cookie = CookieRecord::new("a", "1", ".example.com").with_path("/admin");
        let query = CookieQuery::for_domain("example.com");
        assert!(matches_query(&cookie, &query, Some(&url("https://example.com/admin/users"))));
        assert!(!matches_query(&cookie, &query, Some(&url("https://example.com/public"))));
    }
}
