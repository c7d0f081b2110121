#![allow(dead_code)]

use axum::{Router, routing::get};
use axum_test::TestServer;
use linkcore::api::handlers::{health_handler, redirect_handler};
use linkcore::api::routes::api_routes;
use linkcore::application::services::{ClickMode, CodePolicy};
use linkcore::domain::entities::{NewUrlRecord, UrlRecord};
use linkcore::domain::repositories::UrlRepository;
use linkcore::infrastructure::cache::NullCache;
use linkcore::infrastructure::persistence::MemoryUrlRepository;
use linkcore::state::AppState;
use linkcore::utils::code_generator::RandomCodeGenerator;
use std::sync::Arc;

pub const BASE_URL: &str = "http://s.test";

/// State over a fresh in-memory store, recording clicks inline.
pub fn create_test_state() -> (AppState, Arc<MemoryUrlRepository>) {
    let repository = Arc::new(MemoryUrlRepository::new());

    let state = AppState::new(
        repository.clone(),
        Arc::new(NullCache::new()),
        Arc::new(RandomCodeGenerator::default()),
        CodePolicy {
            max_attempts: 5,
            retry_jitter_ms: 0,
        },
        ClickMode::Immediate,
        BASE_URL,
    );

    (state, repository)
}

/// Router with every public route, as mounted by the server.
pub fn test_router(state: AppState) -> Router {
    Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api", api_routes())
        .with_state(state)
}

pub fn create_test_server() -> (TestServer, Arc<MemoryUrlRepository>) {
    let (state, repository) = create_test_state();
    let server = TestServer::new(test_router(state)).unwrap();
    (server, repository)
}

pub async fn create_test_url(
    repository: &MemoryUrlRepository,
    code: &str,
    url: &str,
    owner: Option<&str>,
) -> UrlRecord {
    repository
        .insert_if_absent(NewUrlRecord {
            original_url: url.to_string(),
            short_code: code.to_string(),
            owner_id: owner.map(str::to_string),
        })
        .await
        .unwrap()
        .unwrap()
}

pub async fn create_flagged_url(
    repository: &MemoryUrlRepository,
    code: &str,
    url: &str,
    reason: &str,
) -> UrlRecord {
    let record = create_test_url(repository, code, url, None).await;
    repository
        .set_flag(record.id, true, Some(reason.to_string()))
        .await
        .unwrap()
        .unwrap()
}
