//! Handlers for admin-only moderation and maintenance.

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::api::dto::{
    edit::{FlagRequest, ReleaseResponse},
    summary::SummaryResponse,
    url_record::UrlResponse,
};
use crate::api::middleware::CurrentIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// Flags a record. Flagged codes answer 451 and stop counting clicks.
///
/// # Endpoint
///
/// `POST /api/urls/{id}/flag` with optional body `{ "reason": "phishing" }`
pub async fn flag_url_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    payload: Option<Json<FlagRequest>>,
) -> Result<Json<UrlResponse>, AppError> {
    let Json(payload) = payload.unwrap_or_default();
    payload.validate()?;

    let record = state
        .management_service
        .flag(id, payload.reason, &identity)
        .await?;

    let short_url = state.short_url(&record.short_code);
    Ok(Json(UrlResponse::from_record(record, short_url)))
}

/// Lifts a flag.
///
/// # Endpoint
///
/// `DELETE /api/urls/{id}/flag`
pub async fn unflag_url_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<UrlResponse>, AppError> {
    let record = state.management_service.unflag(id, &identity).await?;
    let short_url = state.short_url(&record.short_code);
    Ok(Json(UrlResponse::from_record(record, short_url)))
}

/// Detaches all records of a deleted user, keeping them as anonymous.
///
/// # Endpoint
///
/// `POST /api/users/{user_id}/release`
pub async fn release_owner_handler(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<ReleaseResponse>, AppError> {
    let released = state
        .management_service
        .release_owner(&user_id, &identity)
        .await?;

    Ok(Json(ReleaseResponse { user_id, released }))
}

/// Totals for the admin overview.
///
/// # Endpoint
///
/// `GET /api/summary`
pub async fn summary_handler(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<SummaryResponse>, AppError> {
    let summary = state.management_service.summary(&identity).await?;
    Ok(Json(summary.into()))
}
