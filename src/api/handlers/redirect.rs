//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use serde_json::json;

use crate::application::services::Resolution;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Responses
///
/// - **307 Temporary Redirect** to the original URL; the click is counted
/// - **404 Not Found** if no record holds the code
/// - **451 Unavailable For Legal Reasons** if the record is flagged; the
///   body carries the moderation reason and no click is counted
///
/// Codes are case-sensitive.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    match state.resolution_service.resolve(&code).await? {
        Resolution::Found(url) => Ok(Redirect::temporary(&url)),
        Resolution::NotFound => Err(AppError::not_found(
            "Short URL not found",
            json!({ "code": code }),
        )),
        Resolution::Flagged { reason } => Err(AppError::flagged(
            "This link has been flagged and is not available",
            json!({ "code": code, "reason": reason }),
        )),
    }
}
