//! Post-filter removing cookies of the excluded domain family.

/// Any cookie whose domain contains this substring is withheld from callers.
///
/// The match is a plain substring test anywhere in the domain, so
/// `notgoogle.com` is excluded while `googleapis.org` is not.
// TODO: replace with a registrable-domain match once a public suffix list is available.
pub const EXCLUDED_DOMAIN_MARKER: &str = "google.";

/// Returns true if cookies for `domain` must not be handed out.
#[must_use]
pub fn is_excluded_domain(domain: &str) -> bool {
    domain.contains(EXCLUDED_DOMAIN_MARKER)
}
