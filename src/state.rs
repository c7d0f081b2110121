//! Shared application state for HTTP handlers.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::services::{
    ClickMode, CodeArbiter, CodePolicy, ManagementService, ResolutionService, ShorteningService,
};
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::UrlRepository;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::CodeSource;

/// Services and collaborators injected into every handler.
///
/// The store is held as a trait object, so one binary can run against
/// PostgreSQL or the in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub shortening_service: Arc<ShorteningService<dyn UrlRepository>>,
    pub resolution_service: Arc<ResolutionService<dyn UrlRepository>>,
    pub management_service: Arc<ManagementService<dyn UrlRepository>>,
    pub repository: Arc<dyn UrlRepository>,
    pub cache: Arc<dyn CacheService>,
    /// Present in deferred click mode only.
    pub click_sender: Option<mpsc::Sender<ClickEvent>>,
    pub base_url: String,
}

impl AppState {
    /// Wires the services around one store, one cache and one code source.
    pub fn new(
        repository: Arc<dyn UrlRepository>,
        cache: Arc<dyn CacheService>,
        codes: Arc<dyn CodeSource>,
        policy: CodePolicy,
        clicks: ClickMode,
        base_url: impl Into<String>,
    ) -> Self {
        let arbiter = Arc::new(CodeArbiter::new(repository.clone(), codes, policy));

        let click_sender = match &clicks {
            ClickMode::Deferred(sender) => Some(sender.clone()),
            ClickMode::Immediate => None,
        };

        Self {
            shortening_service: Arc::new(ShorteningService::new(arbiter.clone())),
            resolution_service: Arc::new(ResolutionService::new(
                repository.clone(),
                cache.clone(),
                clicks,
            )),
            management_service: Arc::new(ManagementService::new(
                repository.clone(),
                arbiter,
                cache.clone(),
            )),
            repository,
            cache,
            click_sender,
            base_url: base_url.into(),
        }
    }

    /// Renders the public short URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), code)
    }
}
