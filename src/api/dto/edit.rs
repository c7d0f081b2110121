//! DTOs for edit and moderation endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request body for `PATCH /api/urls/{id}`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditCodeRequest {
    #[validate(length(min = 1, message = "shortCode is required"))]
    #[serde(alias = "short_code")]
    pub short_code: String,
}

/// Request body for `POST /api/urls/{id}/flag`. The body itself is optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct FlagRequest {
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Response for `POST /api/users/{user_id}/release`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseResponse {
    pub user_id: String,
    pub released: u64,
}
