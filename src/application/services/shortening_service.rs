//! Short URL creation service.

use std::sync::Arc;

use tracing::info;

use crate::application::services::code_arbiter::{ClaimMode, CodeArbiter};
use crate::domain::entities::UrlRecord;
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::utils::code_generator::validate_custom_code;
use crate::utils::url_validator::validate_url;

/// Service for creating short URLs.
///
/// Validates input and delegates the code claim to the [`CodeArbiter`]:
/// random mode when no alias is requested, custom mode otherwise.
pub struct ShorteningService<R: UrlRepository + ?Sized> {
    arbiter: Arc<CodeArbiter<R>>,
}

impl<R: UrlRepository + ?Sized> ShorteningService<R> {
    pub fn new(arbiter: Arc<CodeArbiter<R>>) -> Self {
        Self { arbiter }
    }

    /// Creates a new record pointing at `original_url`.
    ///
    /// An empty `custom_code` counts as absent. The URL is stored as
    /// submitted (after trimming surrounding whitespace).
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidUrl`] if the URL is not an absolute http(s) URL
    /// - [`AppError::InvalidCode`] if the custom code has a bad format
    /// - [`AppError::CodeTaken`] if the custom code is already in use
    /// - [`AppError::GenerationExhausted`] if random codes kept colliding
    pub async fn shorten(
        &self,
        original_url: &str,
        custom_code: Option<&str>,
        owner_id: Option<String>,
    ) -> Result<UrlRecord, AppError> {
        let original_url = validate_url(original_url)?;

        let mode = match custom_code.filter(|code| !code.is_empty()) {
            Some(code) => {
                validate_custom_code(code)?;
                ClaimMode::Custom(code.to_string())
            }
            None => ClaimMode::Random,
        };

        let record = self.arbiter.claim(original_url, owner_id, mode).await?;

        info!(
            id = record.id,
            code = %record.short_code,
            owner = record.owner_id.as_deref().unwrap_or("-"),
            "Short URL created"
        );

        Ok(record)
    }
}
