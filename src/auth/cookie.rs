//! Session cookie parsing and construction.

use axum::http::header;
use chrono::{DateTime, Utc};

/// Cookie name for the session token.
pub const TOKEN_COOKIE_NAME: &str = "token";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Format a Unix timestamp as an HTTP date (`Thu, 01 Jan 1970 00:00:00 GMT`).
fn http_date(unix_timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix_timestamp, 0)
        .unwrap_or_default()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// `Set-Cookie` value carrying a session token.
/// The cookie expires at the same instant as the token.
pub fn session_cookie(token: &str, max_age_secs: i64, expires_at: i64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}; Expires={}{}",
        TOKEN_COOKIE_NAME,
        token,
        max_age_secs,
        http_date(expires_at),
        secure
    )
}

/// `Set-Cookie` value that empties the session cookie and expires it in the past.
pub fn clear_session_cookie(secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0; Expires={}{}",
        TOKEN_COOKIE_NAME,
        http_date(0),
        secure
    )
}
