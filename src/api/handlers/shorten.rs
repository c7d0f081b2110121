//! Handler for the shortening endpoint.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::shorten::ShortenRequest;
use crate::api::dto::url_record::UrlResponse;
use crate::api::middleware::CurrentIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL owned by the caller (or anonymous).
///
/// # Endpoint
///
/// `POST /api/urls`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com", "customCode": "my-link" }
/// ```
///
/// `customCode` is optional; when absent or empty a random code is generated.
///
/// # Errors
///
/// - 400 for a malformed URL or custom code
/// - 409 if the custom code is taken
/// - 503 if no random code could be allocated or the store is down
pub async fn shorten_handler(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<UrlResponse>), AppError> {
    payload.validate()?;

    let record = state
        .shortening_service
        .shorten(
            &payload.url,
            payload.custom_code.as_deref(),
            identity.user_id,
        )
        .await?;

    let short_url = state.short_url(&record.short_code);
    Ok((
        StatusCode::CREATED,
        Json(UrlResponse::from_record(record, short_url)),
    ))
}
