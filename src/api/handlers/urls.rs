//! Handlers for owner-facing record management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::{
    edit::EditCodeRequest,
    list::{ListParams, ListResponse},
    url_record::UrlResponse,
};
use crate::api::middleware::CurrentIdentity;
use crate::domain::entities::Identity;
use crate::domain::repositories::OwnerFilter;
use crate::error::AppError;
use crate::state::AppState;

/// Lists records visible to the caller.
///
/// # Endpoint
///
/// `GET /api/urls?page=1&pageSize=25&search=git&sortBy=clicks&sortDir=desc`
///
/// Users see their own records. Admins see everything, or narrow with
/// `owner=<user id>` / `owner=anonymous`. Anonymous callers get 403.
pub async fn list_urls_handler(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, AppError> {
    let owner = owner_filter(&identity, params.owner.as_deref())?;
    let query = params.to_query();
    let (page, page_size) = (query.page, query.page_size);

    let (records, total) = state.management_service.list(owner, query).await?;

    let items = records
        .into_iter()
        .map(|record| {
            let short_url = state.short_url(&record.short_code);
            UrlResponse::from_record(record, short_url)
        })
        .collect();

    Ok(Json(ListResponse {
        items,
        total,
        page,
        page_size,
    }))
}

/// Returns one record. Owner or admin only.
///
/// # Endpoint
///
/// `GET /api/urls/{id}`
pub async fn get_url_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<UrlResponse>, AppError> {
    let record = state.management_service.get(id, &identity).await?;
    let short_url = state.short_url(&record.short_code);
    Ok(Json(UrlResponse::from_record(record, short_url)))
}

/// Changes the short code of a record. Owner or admin only.
///
/// # Endpoint
///
/// `PATCH /api/urls/{id}`
///
/// ```json
/// { "shortCode": "new-code" }
/// ```
///
/// # Errors
///
/// 404, 403, 400 (format) or 409 (taken), checked in that order.
pub async fn edit_url_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Json(payload): Json<EditCodeRequest>,
) -> Result<Json<UrlResponse>, AppError> {
    payload.validate()?;

    let record = state
        .management_service
        .edit(id, &payload.short_code, &identity)
        .await?;

    let short_url = state.short_url(&record.short_code);
    Ok(Json(UrlResponse::from_record(record, short_url)))
}

/// Hard-deletes a record and frees its code. Owner or admin only.
///
/// # Endpoint
///
/// `DELETE /api/urls/{id}` → 204 No Content
pub async fn delete_url_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<StatusCode, AppError> {
    if state.management_service.remove(id, &identity).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("URL not found", json!({ "id": id })))
    }
}

fn owner_filter(identity: &Identity, requested: Option<&str>) -> Result<OwnerFilter, AppError> {
    if identity.is_admin {
        return Ok(match requested.map(str::trim).filter(|o| !o.is_empty()) {
            None => OwnerFilter::Any,
            Some("anonymous") => OwnerFilter::Anonymous,
            Some(user_id) => OwnerFilter::User(user_id.to_string()),
        });
    }

    match &identity.user_id {
        Some(user_id) => Ok(OwnerFilter::User(user_id.clone())),
        None => Err(AppError::forbidden(
            "Sign in to list your URLs",
            json!({}),
        )),
    }
}
