//! Background worker applying deferred click increments.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::UrlRepository;

/// Retries after the first failed increment.
const MAX_RETRIES: usize = 3;

/// Consumes click events until every sender is dropped.
///
/// At most `concurrency` increments are in flight at once. Each increment is
/// retried with jittered exponential backoff; a click that still fails is
/// logged and dropped (the counter is best-effort).
pub async fn run_click_worker<R>(
    mut rx: mpsc::Receiver<ClickEvent>,
    repository: Arc<R>,
    concurrency: usize,
) where
    R: UrlRepository + ?Sized + 'static,
{
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let repository = repository.clone();

        tokio::spawn(async move {
            apply_click(repository.as_ref(), &event).await;
            drop(permit);
        });
    }

    // Wait for in-flight increments before returning.
    let _ = permits.acquire_many(concurrency.max(1) as u32).await;
    info!("Click worker stopped");
}

/// Applies one increment with retry. Never fails.
pub async fn apply_click<R>(repository: &R, event: &ClickEvent)
where
    R: UrlRepository + ?Sized,
{
    let strategy = ExponentialBackoff::from_millis(10)
        .max_delay(std::time::Duration::from_millis(500))
        .map(jitter)
        .take(MAX_RETRIES);

    match Retry::start(strategy, || repository.increment_clicks(event.url_id)).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(
                url_id = event.url_id,
                code = %event.short_code,
                "Click for a record that no longer exists"
            );
        }
        Err(e) => {
            metrics::counter!("clicks_failed_total").increment(1);
            warn!(
                url_id = event.url_id,
                code = %event.short_code,
                error = %e,
                "Dropping click after retries"
            );
        }
    }
}
