//! DTOs for the shortening endpoint.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use validator::Validate;

/// Characters a custom code may contain. Empty is allowed and means "generate one".
static CUSTOM_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]*$").expect("valid custom code regex"));

/// Request to shorten one URL.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    /// The original URL to shorten (absolute http or https).
    #[validate(length(min = 1, message = "URL is required"))]
    #[serde(alias = "original_url", alias = "originalUrl")]
    pub url: String,

    /// Optional custom short code. Length and reserved names are checked by the service.
    #[validate(regex(
        path = *CUSTOM_CODE_REGEX,
        message = "Custom code can only contain letters, digits, hyphens and underscores"
    ))]
    #[serde(alias = "custom_code")]
    pub custom_code: Option<String>,
}
