//! Cookie export import.
//!
//! Supports common browser extension export formats:
//! - Netscape HTTP Cookie File format
//! - JSON cookie exports (array or `{ "cookies": [...] }`)

use std::io::BufReader;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use super::{CookieImportError, CookieRecord, DEFAULT_STORE_ID, parse_netscape_cookies};

/// Export format detected during import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Netscape HTTP Cookie File format.
    Netscape,
    /// JSON export format.
    Json,
}

/// Cookies imported from an export, after validation.
#[derive(Debug)]
pub struct ImportedCookies {
    /// Valid, unexpired cookies in file order.
    pub cookies: Vec<CookieRecord>,
    /// Non-fatal warnings encountered while parsing/validating.
    pub warnings: Vec<String>,
    /// Input format that was parsed.
    pub format: ExportFormat,
}

/// Parse and validate a cookie export in either Netscape or JSON format.
///
/// Unlike a capture for outgoing requests, an import that leaves zero cookies
/// is not an error: the store simply starts empty.
///
/// # Errors
///
/// Returns [`CookieImportError`] when input is empty or cannot be parsed.
#[instrument(level = "debug", skip(input))]
pub fn parse_cookie_export(input: &str) -> Result<ImportedCookies, CookieImportError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CookieImportError::EmptyInput);
    }

    let (cookies, mut warnings, format) = if looks_like_json(trimmed) {
        let (cookies, warnings) = parse_json_cookies(trimmed)?;
        (cookies, warnings, ExportFormat::Json)
    } else {
        let result = parse_netscape_cookies(BufReader::new(input.as_bytes()))?;
        let warnings = result
            .warnings
            .iter()
            .map(|(line, reason)| format!("line {line}: {reason}"))
            .collect::<Vec<_>>();
        (result.cookies, warnings, ExportFormat::Netscape)
    };

    let (cookies, validation_warnings) = drop_expired(cookies, unix_now());
    warnings.extend(validation_warnings);

    Ok(ImportedCookies {
        cookies,
        warnings,
        format,
    })
}

/// Reads and parses a cookie export file.
///
/// # Errors
///
/// Returns [`CookieImportError::Io`] when the file cannot be read, or any
/// parse error from [`parse_cookie_export`].
pub async fn import_cookie_file(path: &Path) -> Result<ImportedCookies, CookieImportError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CookieImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let imported = parse_cookie_export(&raw)?;
    info!(
        path = %path.display(),
        cookies = imported.cookies.len(),
        warnings = imported.warnings.len(),
        format = ?imported.format,
        "Imported cookies"
    );
    Ok(imported)
}

fn looks_like_json(input: &str) -> bool {
    input.starts_with('[') || input.starts_with('{')
}

fn drop_expired(cookies: Vec<CookieRecord>, now: u64) -> (Vec<CookieRecord>, Vec<String>) {
    let mut valid = Vec::with_capacity(cookies.len());
    let mut warnings = Vec::new();

    #[allow(clippy::cast_precision_loss)]
    let now = now as f64;
    for cookie in cookies {
        if cookie.expiration_date.is_some_and(|expires| expires <= now) {
            warnings.push(format!(
                "skipped expired cookie '{}' for domain '{}'",
                cookie.name, cookie.domain
            ));
            continue;
        }
        valid.push(cookie);
    }

    (valid, warnings)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

fn parse_json_cookies(input: &str) -> Result<(Vec<CookieRecord>, Vec<String>), CookieImportError> {
    let entries = match serde_json::from_str::<Value>(input)? {
        Value::Array(entries) => entries,
        Value::Object(mut payload) => match payload.remove("cookies") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(CookieImportError::UnexpectedJsonShape),
        },
        _ => return Err(CookieImportError::UnexpectedJsonShape),
    };

    let mut cookies = Vec::new();
    let mut warnings = Vec::new();

    // A mistyped field drops only its own entry.
    for (index, entry) in entries.into_iter().enumerate() {
        let converted = serde_json::from_value::<JsonCookieEntry>(entry)
            .map_err(|error| error.to_string())
            .and_then(convert_json_cookie);
        match converted {
            Ok(cookie) => cookies.push(cookie),
            Err(reason) => warnings.push(format!("entry {}: {}", index + 1, reason)),
        }
    }

    Ok((cookies, warnings))
}

fn convert_json_cookie(entry: JsonCookieEntry) -> Result<CookieRecord, String> {
    let mut domain = entry
        .domain
        .or(entry.host)
        .unwrap_or_default()
        .trim()
        .to_string();

    if domain.is_empty() {
        return Err("missing required field: domain".to_string());
    }

    if let Some(stripped) = domain.strip_prefix("http://") {
        domain = stripped.to_string();
    } else if let Some(stripped) = domain.strip_prefix("https://") {
        domain = stripped.to_string();
    }
    if let Some((host, _rest)) = domain.split_once('/') {
        domain = host.to_string();
    }

    let host_only = entry.host_only.unwrap_or(!domain.starts_with('.'));
    if !host_only && !domain.starts_with('.') {
        domain = format!(".{domain}");
    }
    if host_only {
        domain = domain.trim_start_matches('.').to_string();
    }

    let mut path = entry.path.unwrap_or_else(|| "/".to_string());
    if path.trim().is_empty() {
        path = "/".to_string();
    } else if !path.starts_with('/') {
        path = format!("/{path}");
    }

    let name = entry.name.unwrap_or_default().trim().to_string();
    if name.is_empty() {
        return Err("missing required field: name".to_string());
    }

    let mut cookie = CookieRecord::new(name, entry.value.unwrap_or_default(), domain)
        .with_path(path)
        .with_secure(entry.secure.unwrap_or(false))
        .with_http_only(entry.http_only.unwrap_or(false));
    cookie.host_only = host_only;
    cookie.store_id = entry
        .store_id
        .unwrap_or_else(|| DEFAULT_STORE_ID.to_string());

    let expiry = entry
        .expiration_date
        .or(entry.expires)
        .filter(|raw| raw.is_finite() && *raw > 0.0);
    if let Some(expires_at) = expiry
        && !entry.session.unwrap_or(false)
    {
        cookie = cookie.with_expiration(expires_at);
    }

    Ok(cookie)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonCookieEntry {
    domain: Option<String>,
    host: Option<String>,
    host_only: Option<bool>,
    path: Option<String>,
    secure: Option<bool>,
    http_only: Option<bool>,
    session: Option<bool>,
    name: Option<String>,
    value: Option<String>,
    expiration_date: Option<f64>,
    expires: Option<f64>,
    store_id: Option<String>,
}
