//! Short code resolution and click counting.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::UrlRecord;
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, CachedTarget};

/// Outcome of resolving a short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Live record; redirect to this URL.
    Found(String),
    NotFound,
    /// The record exists but is under moderation. Do not redirect.
    Flagged { reason: Option<String> },
}

/// How resolved clicks reach the counter.
#[derive(Debug, Clone)]
pub enum ClickMode {
    /// Increment inline before answering. Failures are still swallowed.
    Immediate,
    /// Hand the click to the background worker through a bounded queue.
    Deferred(mpsc::Sender<ClickEvent>),
}

/// Resolves short codes for the redirect path.
///
/// A lookup hits the cache first, then the store. Click counting is
/// best-effort: a lost increment is logged and counted, never turned into a
/// failed resolution.
pub struct ResolutionService<R: UrlRepository + ?Sized> {
    repository: Arc<R>,
    cache: Arc<dyn CacheService>,
    clicks: ClickMode,
}

impl<R: UrlRepository + ?Sized> ResolutionService<R> {
    pub fn new(repository: Arc<R>, cache: Arc<dyn CacheService>, clicks: ClickMode) -> Self {
        Self {
            repository,
            cache,
            clicks,
        }
    }

    /// Resolves `code` and records a click when it is live.
    ///
    /// Flagged records never accrue clicks.
    ///
    /// # Errors
    ///
    /// Only store failures surface, as [`AppError::StorageUnavailable`] or
    /// [`AppError::Internal`].
    pub async fn resolve(&self, code: &str) -> Result<Resolution, AppError> {
        if let Ok(Some(target)) = self.cache.get_target(code).await {
            self.record_click(target.id, code).await;
            return Ok(Resolution::Found(target.original_url));
        }

        let Some(record) = self.repository.find_by_code(code).await? else {
            debug!(code, "Short code not found");
            return Ok(Resolution::NotFound);
        };

        if record.flagged {
            debug!(code, id = record.id, "Resolved a flagged record");
            return Ok(Resolution::Flagged {
                reason: record.flag_reason,
            });
        }

        self.remember(&record).await;
        self.record_click(record.id, code).await;

        Ok(Resolution::Found(record.original_url))
    }

    async fn remember(&self, record: &UrlRecord) {
        let target = CachedTarget {
            id: record.id,
            original_url: record.original_url.clone(),
        };
        if let Err(e) = self.cache.set_target(&record.short_code, &target, None).await {
            warn!(code = %record.short_code, error = %e, "Failed to cache resolution");
        }
    }

    async fn record_click(&self, url_id: i64, code: &str) {
        match &self.clicks {
            ClickMode::Immediate => {
                if let Err(e) = self.repository.increment_clicks(url_id).await {
                    metrics::counter!("clicks_failed_total").increment(1);
                    warn!(url_id, code, error = %e, "Failed to record click");
                }
            }
            ClickMode::Deferred(sender) => match sender.try_send(ClickEvent::new(url_id, code)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    metrics::counter!("clicks_dropped_total").increment(1);
                    warn!(url_id, code, "Click queue full, dropping click");
                }
                Err(TrySendError::Closed(_)) => {
                    metrics::counter!("clicks_dropped_total").increment(1);
                    warn!(url_id, code, "Click worker stopped, dropping click");
                }
            },
        }
    }
}
