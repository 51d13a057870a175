//! Utility functions shared by the pipeline stages.
//!
//! - HTTP client construction with browser-like default headers
//! - String truncation for logging response bodies
//! - Title cleaning for filenames
//! - Code-fence stripping for model output
//! - Response status checking and JSON decoding into [`ServiceError`]s

use crate::errors::ServiceError;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Desktop Chrome user agent. Some hosts sit behind a firewall that rejects
/// obvious script clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Build the single HTTP client shared by every stage.
///
/// Requests set their own overall timeouts; the client only bounds connecting.
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/json,image/*;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .build()
}

/// Turn a non-2xx response into [`ServiceError::Status`], keeping a bounded
/// slice of the body for diagnosis.
pub async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        service,
        status,
        body: truncate_for_log(&body, 500),
    })
}

/// Read the body and decode it. A body that breaks off is a
/// [`ServiceError::Body`] and malformed JSON is a [`ServiceError::Decode`].
/// Neither is a transport failure, so callers never retry on them.
pub async fn decode_json<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    let body = response
        .text()
        .await
        .map_err(|source| ServiceError::Body { service, source })?;
    serde_json::from_str(&body).map_err(|e| ServiceError::decode(service, e))
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a char boundary) with
/// an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Keep only alphanumerics, spaces and hyphens, then drop trailing whitespace.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_title("Mars: Water Found!"), "Mars Water Found");
/// ```
pub fn clean_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .collect::<String>()
        .trim_end()
        .to_string()
}

// A language tag only counts when it is the whole rest of the fence line.
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)```(?:[A-Za-z]+[ \t\r]*$)?").expect("static regex"));

/// Remove markdown code fences (```` ```html ````, ```` ``` ````) that models
/// like to wrap HTML in, and trim the result.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}
