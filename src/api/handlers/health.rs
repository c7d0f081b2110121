//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Storage**: store round-trip (`SELECT 1` on PostgreSQL)
/// 2. **Click Queue**: channel open and free capacity (deferred mode)
/// 3. **Cache**: Redis PING, or "disabled"
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "storage": { "status": "ok", "message": "Connected" },
///     "click_queue": { "status": "ok", "message": "Capacity: 10000" },
///     "cache": { "status": "ok", "message": "Redis connected" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let storage = check_storage(&state).await;
    let click_queue = check_click_queue(&state);
    let cache = check_cache(&state).await;

    let all_healthy = storage.is_ok() && click_queue.is_ok() && cache.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            storage,
            click_queue,
            cache,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_storage(state: &AppState) -> CheckStatus {
    match state.repository.ping().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Storage error: {}", e)),
    }
}

fn check_click_queue(state: &AppState) -> CheckStatus {
    match &state.click_sender {
        None => CheckStatus::ok("Immediate mode"),
        Some(sender) if sender.is_closed() => CheckStatus::error("Click queue is closed"),
        Some(sender) => CheckStatus::ok(format!("Capacity: {}", sender.capacity())),
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    let backend = state.cache.backend();
    if backend == "disabled" {
        return CheckStatus::ok("Disabled");
    }

    if state.cache.health_check().await {
        CheckStatus::ok(format!("{} connected", capitalize(backend)))
    } else {
        CheckStatus::error(format!("{} connection failed", capitalize(backend)))
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
