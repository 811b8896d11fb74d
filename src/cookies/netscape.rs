//! Netscape cookie file parser.
//!
//! Parses the Netscape HTTP cookie file format (7 TAB-separated fields per line)
//! into [`CookieRecord`]s. The curl `#HttpOnly_` domain prefix is honoured.

use std::io::BufRead;

use tracing::{debug, instrument, warn};

use super::{CookieImportError, CookieRecord};

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Result of parsing a cookie file, including successfully parsed cookies
/// and any warnings about malformed lines.
#[derive(Debug)]
pub struct NetscapeParseResult {
    /// Successfully parsed cookies.
    pub cookies: Vec<CookieRecord>,
    /// Warnings for malformed lines (line number and reason).
    pub warnings: Vec<(usize, String)>,
}

/// Parses a Netscape-format cookie file from a buffered reader.
///
/// Each non-comment, non-blank line must contain exactly 7 TAB-separated fields:
/// `domain`, `tailmatch`, `path`, `secure`, `expires`, `name`, `value`.
///
/// Lines starting with `#` and blank lines are skipped, except lines starting
/// with `#HttpOnly_`, which carry an http-only cookie.
///
/// # Errors
///
/// Returns [`CookieImportError::Read`] on read failure, or
/// [`CookieImportError::NoCookiesFound`] when a non-empty file yields zero valid cookies.
/// Individual malformed lines are collected as warnings (partial success).
#[instrument(level = "debug", skip(reader))]
pub fn parse_netscape_cookies(reader: impl BufRead) -> Result<NetscapeParseResult, CookieImportError> {
    let mut cookies = Vec::new();
    let mut warnings = Vec::new();
    let mut non_blank_lines = 0;

    for (idx, line_result) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line_result?;
        // Only the line ending goes; an empty value leaves a trailing TAB.
        let line = line.trim_end_matches(['\r', '\n']);

        if line.trim().is_empty() {
            continue;
        }

        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None if line.starts_with('#') => continue,
            None => (line, false),
        };

        non_blank_lines += 1;

        match parse_cookie_line(line, line_number) {
            Ok(cookie) => {
                let cookie = cookie.with_http_only(http_only);
                debug!(
                    line = line_number,
                    domain = %cookie.domain,
                    name = %cookie.name,
                    "parsed cookie"
                );
                cookies.push(cookie);
            }
            Err(e) => {
                warn!(line = line_number, reason = %e, "skipping malformed cookie line");
                let reason = match e {
                    CookieImportError::InvalidLine {
                        reason, content, ..
                    } => format!("{reason} (got: {content})"),
                    other => other.to_string(),
                };
                warnings.push((line_number, reason));
            }
        }
    }

    if cookies.is_empty() && non_blank_lines > 0 {
        return Err(CookieImportError::NoCookiesFound {
            malformed_count: warnings.len(),
        });
    }

    Ok(NetscapeParseResult { cookies, warnings })
}

fn parse_cookie_line(line: &str, line_number: usize) -> Result<CookieRecord, CookieImportError> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() != 7 {
        return Err(invalid_line(
            line,
            line_number,
            format!("expected 7 TAB-separated fields, found {}", fields.len()),
        ));
    }

    let domain = fields[0];
    let tailmatch = parse_bool_field(fields[1], "tailmatch", line_number, line)?;
    let path = fields[2];
    let secure = parse_bool_field(fields[3], "secure", line_number, line)?;

    let expires = fields[4].parse::<u64>().map_err(|_| {
        invalid_line(
            line,
            line_number,
            format!(
                "expires field must be a non-negative integer, got '{}'",
                fields[4]
            ),
        )
    })?;

    let name = fields[5];
    let value = fields[6];

    if domain.is_empty() {
        return Err(invalid_line(line, line_number, "domain field is empty".to_string()));
    }
    if name.is_empty() {
        return Err(invalid_line(
            line,
            line_number,
            "cookie name field is empty".to_string(),
        ));
    }

    // The tailmatch flag decides host-only, whatever the leading dot says.
    let mut cookie = CookieRecord::new(name, value, domain)
        .with_path(if path.is_empty() { "/" } else { path })
        .with_secure(secure);
    cookie.host_only = !tailmatch;
    if expires > 0 {
        #[allow(clippy::cast_precision_loss)]
        let expires_at = expires as f64;
        cookie = cookie.with_expiration(expires_at);
    }
    Ok(cookie)
}

fn parse_bool_field(
    value: &str,
    field_name: &str,
    line_number: usize,
    line: &str,
) -> Result<bool, CookieImportError> {
    match value {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        _ => Err(invalid_line(
            line,
            line_number,
            format!("{field_name} field must be TRUE or FALSE, got '{value}'"),
        )),
    }
}

fn invalid_line(line: &str, line_number: usize, reason: String) -> CookieImportError {
    CookieImportError::InvalidLine {
        line_number,
        content: redact_line_for_error(line),
        reason,
    }
}

/// Redacts cookie value (7th field) from a line for safe error messages.
fn redact_line_for_error(line: &str) -> String {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() >= 7 {
        let mut redacted = fields[..6].join("\t");
        redacted.push_str("\t[REDACTED]");
        redacted
    } else {
        // Not enough fields to identify value — show as-is (no value present)
        line.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn cursor(s: &str) -> Cursor<&[u8]> {
        Cursor::new(s.as_bytes())
    }

    #[test]
    fn test_parse_netscape_cookies_valid_file() {
        let input = "\
# Netscape HTTP Cookie File
.example.com\tTRUE\t/\tFALSE\t0\tsession\tabc123
other.com\tFALSE\t/path\tTRUE\t1700000000\ttoken\txyz789
";
        let result = parse_netscape_cookies(cursor(input)).unwrap();
        assert_eq!(result.cookies.len(), 2);
        assert!(result.warnings.is_empty());

        let first = &result.cookies[0];
        assert_eq!(first.domain, ".example.com");
        assert!(!first.host_only);
        assert_eq!(first.path, "/");
        assert!(!first.secure);
        assert!(first.session);
        assert!(first.expiration_date.is_none());
        assert_eq!(first.name, "session");
        assert_eq!(first.value(), "abc123");

        let second = &result.cookies[1];
        assert!(second.host_only);
        assert!(second.secure);
        assert!(!second.session);
        assert_eq!(second.expiration_date, Some(1_700_000_000.0));
    }

    #[test]
    fn test_parse_netscape_cookies_http_only_prefix() {
        let input = "#HttpOnly_.example.com\tTRUE\t/\tTRUE\t0\tsid\tv\n";
        let result = parse_netscape_cookies(cursor(input)).unwrap();
        assert_eq!(result.cookies.len(), 1);
        assert!(result.cookies[0].http_only);
        assert_eq!(result.cookies[0].domain, ".example.com");
    }

    #[test]
    fn test_parse_netscape_cookies_comment_and_blank_lines() {
        let input = "\
# Netscape HTTP Cookie File
# This is a comment

.example.com\tTRUE\t/\tFALSE\t0\tname\tvalue

# Another comment
";
        let result = parse_netscape_cookies(cursor(input)).unwrap();
        assert_eq!(result.cookies.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_parse_netscape_cookies_malformed_lines_with_line_numbers() {
        let input = "\
# Header
.good.com\tTRUE\t/\tFALSE\t0\tname\tvalue
bad line without tabs
.also-good.com\tTRUE\t/\tFALSE\t0\tother\tval
";
        let result = parse_netscape_cookies(cursor(input)).unwrap();
        assert_eq!(result.cookies.len(), 2, "should parse 2 valid cookies");
        assert_eq!(result.warnings.len(), 1, "should have 1 warning");
        assert_eq!(result.warnings[0].0, 3, "warning should be for line 3");
        assert!(
            result.warnings[0]
                .1
                .contains("expected 7 TAB-separated fields"),
            "warning should mention field count"
        );
    }

    #[test]
    fn test_parse_netscape_cookies_empty_file() {
        let result = parse_netscape_cookies(cursor("")).unwrap();
        assert!(result.cookies.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_parse_netscape_cookies_all_malformed_returns_error() {
        let input = "\
bad line one
another bad line
";
        let err = parse_netscape_cookies(cursor(input)).unwrap_err();
        assert!(
            matches!(err, CookieImportError::NoCookiesFound { malformed_count: 2 }),
            "expected NoCookiesFound with 2 malformed, got: {err}"
        );
    }

    #[test]
    fn test_parse_netscape_cookies_invalid_fields_rejected() {
        for input in [
            ".example.com\tYES\t/\tFALSE\t0\tname\tvalue\n",
            ".example.com\tTRUE\t/\tFALSE\tnot-a-number\tname\tvalue\n",
            "\tTRUE\t/\tFALSE\t0\tname\tvalue\n",
            ".example.com\tTRUE\t/\tFALSE\t0\t\tvalue\n",
        ] {
            assert!(parse_netscape_cookies(cursor(input)).is_err(), "{input:?}");
        }
    }

    #[test]
    fn test_parse_netscape_cookies_crlf_line_endings() {
        let input = "# Header\r\n.example.com\tTRUE\t/\tFALSE\t0\tname\tvalue\r\n";
        let result = parse_netscape_cookies(cursor(input)).unwrap();
        assert_eq!(result.cookies[0].value(), "value");
    }

    #[test]
    fn test_parse_netscape_cookies_keeps_empty_and_padded_values() {
        let input = "\
.a.com\tTRUE\t/\tFALSE\t0\tflag\t
.a.com\tTRUE\t/\tFALSE\t0\tpadded\tv \r
.a.com\tTRUE\t/\tFALSE\t0\tsid\tv
";
        let result = parse_netscape_cookies(cursor(input)).unwrap();
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        let names: Vec<_> = result.cookies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["flag", "padded", "sid"]);
        assert_eq!(result.cookies[0].value(), "");
        assert_eq!(result.cookies[1].value(), "v ");
    }

    #[test]
    fn test_parse_netscape_cookies_whitespace_only_line_is_blank() {
        let input = "  \t \n.a.com\tTRUE\t/\tFALSE\t0\tsid\tv\n";
        let result = parse_netscape_cookies(cursor(input)).unwrap();
        assert_eq!(result.cookies.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_parse_netscape_cookies_warning_reason_has_no_line_prefix() {
        let input = ".a.com\tTRUE\t/\tFALSE\t0\tsid\tv\nbroken\n";
        let result = parse_netscape_cookies(cursor(input)).unwrap();
        assert_eq!(result.warnings[0].0, 2);
        assert!(
            result.warnings[0].1.starts_with("expected 7 TAB-separated fields"),
            "{}",
            result.warnings[0].1
        );
    }

    #[test]
    fn test_redact_line_for_error_hides_value() {
        let line = ".example.com\tTRUE\t/\tFALSE\t0\tname\tsecret_value";
        let redacted = redact_line_for_error(line);
        assert!(!redacted.contains("secret_value"));
        assert!(redacted.contains("[REDACTED]"));
        assert!(redacted.contains("name"));
    }
}
