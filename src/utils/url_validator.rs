//! Validation of target URLs before they are shortened.
//!
//! Targets are stored exactly as submitted (minus surrounding whitespace);
//! validation only decides whether a string is an acceptable absolute URL.
//! The stored string becomes a `Location` header verbatim, so it may not
//! contain control characters even where the URL parser would skip them.

use serde_json::json;
use url::Url;

use crate::error::AppError;

/// Longest target URL, in characters, the store accepts.
pub const MAX_URL_LENGTH: usize = 2000;

/// Reasons a target URL is rejected.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UrlValidationError {
    #[error("URL is required")]
    Empty,

    #[error("URL must be at most {MAX_URL_LENGTH} characters")]
    TooLong,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,

    #[error("URL must not contain control characters")]
    ControlCharacter,
}

/// Checks that `input` is an absolute HTTP(S) URL with a host.
///
/// # Errors
///
/// Returns [`UrlValidationError`] describing the first failed rule.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(check_url(" https://example.com ").unwrap(), "https://example.com");
/// assert!(check_url("javascript:alert(1)").is_err());
/// assert!(check_url("/relative/path").is_err());
/// ```
pub fn check_url(input: &str) -> Result<&str, UrlValidationError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }

    if trimmed.chars().count() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong);
    }

    if trimmed.chars().any(char::is_control) {
        return Err(UrlValidationError::ControlCharacter);
    }

    let url = Url::parse(trimmed).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(trimmed),
        _ => Err(UrlValidationError::MissingHost),
    }
}

/// Same as [`check_url`], returning an owned string or [`AppError::InvalidUrl`].
pub fn validate_url(input: &str) -> Result<String, AppError> {
    check_url(input).map(str::to_string).map_err(|e| {
        AppError::invalid_url("Invalid URL format", json!({ "reason": e.to_string() }))
    })
}
