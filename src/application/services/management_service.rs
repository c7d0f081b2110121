//! Owner and moderator operations on existing records.

use std::sync::Arc;

use serde_json::json;
use tokio_retry::Retry;
use tokio_retry::strategy::{FixedInterval, jitter};
use tracing::{error, info, warn};

use crate::application::services::code_arbiter::CodeArbiter;
use crate::domain::entities::{Identity, UrlRecord};
use crate::domain::repositories::{
    ListQuery, MAX_PAGE_SIZE, OwnerFilter, UrlRepository, UrlSummary,
};
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::validate_custom_code;

/// Retries after the first failed cache invalidation.
const INVALIDATION_RETRIES: usize = 3;

/// Service for editing, removing, moderating and listing records.
///
/// Ownership checks use [`Identity::can_manage`]; moderation and the
/// admin overview require [`Identity::is_admin`]. Every change that could
/// alter a resolution drops the affected cache entry.
pub struct ManagementService<R: UrlRepository + ?Sized> {
    repository: Arc<R>,
    arbiter: Arc<CodeArbiter<R>>,
    cache: Arc<dyn CacheService>,
}

impl<R: UrlRepository + ?Sized> ManagementService<R> {
    pub fn new(
        repository: Arc<R>,
        arbiter: Arc<CodeArbiter<R>>,
        cache: Arc<dyn CacheService>,
    ) -> Self {
        Self {
            repository,
            arbiter,
            cache,
        }
    }

    /// Fetches a record the requester may manage.
    pub async fn get(&self, id: i64, requester: &Identity) -> Result<UrlRecord, AppError> {
        let record = self.load(id).await?;
        ensure_can_manage(requester, &record)?;
        Ok(record)
    }

    /// Changes the short code of a record.
    ///
    /// Editing to the record's current code is a successful no-op.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, `InvalidCode` or `CodeTaken`, checked in that order.
    pub async fn edit(
        &self,
        id: i64,
        new_code: &str,
        requester: &Identity,
    ) -> Result<UrlRecord, AppError> {
        let record = self.load(id).await?;
        ensure_can_manage(requester, &record)?;
        validate_custom_code(new_code)?;

        let updated = self.arbiter.reclaim(&record, new_code).await?;

        if updated.short_code != record.short_code {
            self.invalidate(&record.short_code).await;
            info!(
                id,
                from = %record.short_code,
                to = %updated.short_code,
                "Short code changed"
            );
        }

        Ok(updated)
    }

    /// Hard-deletes a record, freeing its code.
    ///
    /// Returns `false` if the record disappeared between the check and the delete.
    pub async fn remove(&self, id: i64, requester: &Identity) -> Result<bool, AppError> {
        let record = self.load(id).await?;
        ensure_can_manage(requester, &record)?;

        let deleted = self.repository.delete(id).await?;
        self.invalidate(&record.short_code).await;

        if deleted {
            info!(id, code = %record.short_code, "URL deleted");
        }

        Ok(deleted)
    }

    /// Puts a record under moderation. Flagged codes stop redirecting.
    pub async fn flag(
        &self,
        id: i64,
        reason: Option<String>,
        requester: &Identity,
    ) -> Result<UrlRecord, AppError> {
        ensure_admin(requester)?;
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let record = self.set_flag(id, true, reason).await?;
        info!(id, code = %record.short_code, reason = ?record.flag_reason, "URL flagged");
        Ok(record)
    }

    /// Lifts moderation and clears the reason.
    pub async fn unflag(&self, id: i64, requester: &Identity) -> Result<UrlRecord, AppError> {
        ensure_admin(requester)?;

        let record = self.set_flag(id, false, None).await?;
        info!(id, code = %record.short_code, "URL unflagged");
        Ok(record)
    }

    /// Lists records matching `owner`, with search, sort and pagination.
    ///
    /// # Errors
    ///
    /// [`AppError::Validation`] for page `0` or a page size outside `1..=100`.
    pub async fn list(
        &self,
        owner: OwnerFilter,
        query: ListQuery,
    ) -> Result<(Vec<UrlRecord>, i64), AppError> {
        if query.page == 0 {
            return Err(AppError::bad_request(
                "Page must be at least 1",
                json!({ "page": query.page }),
            ));
        }
        if query.page_size == 0 || query.page_size > MAX_PAGE_SIZE {
            return Err(AppError::bad_request(
                format!("Page size must be between 1 and {MAX_PAGE_SIZE}"),
                json!({ "page_size": query.page_size }),
            ));
        }

        self.repository.list_by_owner(owner, query).await
    }

    /// Detaches every record of a deleted user. Records are kept, as anonymous.
    pub async fn release_owner(
        &self,
        user_id: &str,
        requester: &Identity,
    ) -> Result<u64, AppError> {
        ensure_admin(requester)?;

        let released = self.repository.clear_owner(user_id).await?;
        info!(user_id, released, "Released URLs of deleted user");
        Ok(released)
    }

    pub async fn summary(&self, requester: &Identity) -> Result<UrlSummary, AppError> {
        ensure_admin(requester)?;
        self.repository.summary().await
    }

    async fn load(&self, id: i64) -> Result<UrlRecord, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("URL not found", json!({ "id": id })))
    }

    async fn set_flag(
        &self,
        id: i64,
        flagged: bool,
        reason: Option<String>,
    ) -> Result<UrlRecord, AppError> {
        let record = self
            .repository
            .set_flag(id, flagged, reason)
            .await?
            .ok_or_else(|| AppError::not_found("URL not found", json!({ "id": id })))?;

        self.invalidate(&record.short_code).await;
        Ok(record)
    }

    /// Drops the cached target for `code`, retrying transient failures.
    ///
    /// The store write has already happened, so a final failure does not fail
    /// the operation. It is logged and counted; the stale target can be served
    /// until its TTL runs out.
    async fn invalidate(&self, code: &str) {
        let strategy = FixedInterval::from_millis(20)
            .map(jitter)
            .take(INVALIDATION_RETRIES);

        let result = Retry::start(strategy, || async move {
            let attempt = self.cache.invalidate(code).await;
            if let Err(e) = &attempt {
                warn!(code, error = %e, "Cache invalidation attempt failed");
            }
            attempt
        })
        .await;

        if let Err(e) = result {
            metrics::counter!("cache_invalidation_failed_total").increment(1);
            error!(
                code,
                backend = self.cache.backend(),
                error = %e,
                "Giving up on cache invalidation, stale target may be served until TTL"
            );
        }
    }
}

fn ensure_can_manage(requester: &Identity, record: &UrlRecord) -> Result<(), AppError> {
    if requester.can_manage(record) {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "You do not have access to this URL",
            json!({ "id": record.id }),
        ))
    }
}

fn ensure_admin(requester: &Identity) -> Result<(), AppError> {
    if requester.is_admin {
        Ok(())
    } else {
        Err(AppError::forbidden("Admin role required", json!({})))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::code_arbiter::testing::*;
    use crate::application::services::resolution_service::{
        ClickMode, Resolution, ResolutionService,
    };
    use crate::domain::entities::NewUrlRecord;
    use crate::domain::repositories::{CodeUpdate, MockUrlRepository};
    use crate::infrastructure::cache::testing::{FlakyInvalidation, MapCache, Slot};
    use crate::infrastructure::cache::NullCache;
    use crate::infrastructure::persistence::MemoryUrlRepository;

    struct Wired {
        cache: Arc<MapCache>,
        manage: ManagementService<MemoryUrlRepository>,
        resolve: ResolutionService<MemoryUrlRepository>,
        id: i64,
    }

    /// Memory store with one record `promo1`, owned by `u1` and already cached.
    async fn wired() -> Wired {
        let repo = Arc::new(MemoryUrlRepository::new());
        let cache = Arc::new(MapCache::default());
        let arbiter = CodeArbiter::new(
            repo.clone(),
            Arc::new(ScriptedCodes::new(&["unused"])),
            no_jitter(5),
        );
        let manage = ManagementService::new(repo.clone(), Arc::new(arbiter), cache.clone());
        let resolve = ResolutionService::new(repo.clone(), cache.clone(), ClickMode::Immediate);

        let stored = repo
            .insert_if_absent(NewUrlRecord {
                original_url: "https://example.com/promo".to_string(),
                short_code: "promo1".to_string(),
                owner_id: Some("u1".to_string()),
            })
            .await
            .unwrap()
            .unwrap();

        resolve.resolve("promo1").await.unwrap();
        assert!(cache.target("promo1").is_some());

        Wired {
            cache,
            manage,
            resolve,
            id: stored.id,
        }
    }

    fn service(repo: MockUrlRepository) -> ManagementService<MockUrlRepository> {
        let repo = Arc::new(repo);
        let arbiter = CodeArbiter::new(
            repo.clone(),
            Arc::new(ScriptedCodes::new(&["unused"])),
            no_jitter(5),
        );
        ManagementService::new(repo, Arc::new(arbiter), Arc::new(NullCache::new()))
    }

    fn owned_by_u1(repo: &mut MockUrlRepository) {
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(record(id, "mycode", Some("u1")))));
    }

    #[tokio::test]
    async fn test_edit_by_owner() {
        let mut repo = MockUrlRepository::new();
        owned_by_u1(&mut repo);
        repo.expect_update_code()
            .withf(|id, code| *id == 1 && code == "newcode")
            .times(1)
            .returning(|id, code| Ok(CodeUpdate::Updated(record(id, code, Some("u1")))));

        let updated = service(repo)
            .edit(1, "newcode", &Identity::user("u1"))
            .await
            .unwrap();

        assert_eq!(updated.short_code, "newcode");
    }

    #[tokio::test]
    async fn test_edit_by_stranger_is_forbidden() {
        let mut repo = MockUrlRepository::new();
        owned_by_u1(&mut repo);
        repo.expect_update_code().times(0);

        let err = service(repo)
            .edit(1, "newcode", &Identity::user("u2"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_anonymous_cannot_edit_anonymous_record() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(record(id, "anon01", None))));

        let err = service(repo)
            .edit(1, "newcode", &Identity::anonymous())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_edit_forbidden_before_format_check() {
        let mut repo = MockUrlRepository::new();
        owned_by_u1(&mut repo);

        let err = service(repo)
            .edit(1, "x", &Identity::user("u2"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_edit_invalid_code() {
        let mut repo = MockUrlRepository::new();
        owned_by_u1(&mut repo);
        repo.expect_update_code().times(0);

        let err = service(repo)
            .edit(1, "bad code!", &Identity::user("u1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidCode { .. }));
    }

    #[tokio::test]
    async fn test_admin_edit_to_taken_code() {
        let mut repo = MockUrlRepository::new();
        owned_by_u1(&mut repo);
        repo.expect_update_code()
            .returning(|_, _| Ok(CodeUpdate::Taken));

        let err = service(repo)
            .edit(1, "taken1", &Identity::admin("root"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::CodeTaken { .. }));
    }

    #[tokio::test]
    async fn test_edit_missing_record() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let err = service(repo)
            .edit(99, "newcode", &Identity::admin("root"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_by_owner() {
        let mut repo = MockUrlRepository::new();
        owned_by_u1(&mut repo);
        repo.expect_delete()
            .withf(|id| *id == 1)
            .times(1)
            .returning(|_| Ok(true));

        assert!(service(repo).remove(1, &Identity::user("u1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_by_stranger_is_forbidden() {
        let mut repo = MockUrlRepository::new();
        owned_by_u1(&mut repo);
        repo.expect_delete().times(0);

        let err = service(repo)
            .remove(1, &Identity::user("u2"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_flag_requires_admin() {
        let mut repo = MockUrlRepository::new();
        repo.expect_set_flag().times(0);

        let err = service(repo)
            .flag(1, Some("spam".to_string()), &Identity::user("u1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_flag_trims_reason() {
        let mut repo = MockUrlRepository::new();
        repo.expect_set_flag()
            .withf(|id, flagged, reason| {
                *id == 1 && *flagged && reason.as_deref() == Some("spam")
            })
            .times(1)
            .returning(|id, flagged, reason| {
                let mut r = record(id, "mycode", Some("u1"));
                r.flagged = flagged;
                r.flag_reason = reason;
                Ok(Some(r))
            });

        let record = service(repo)
            .flag(1, Some("  spam ".to_string()), &Identity::admin("root"))
            .await
            .unwrap();

        assert!(record.flagged);
        assert_eq!(record.flag_reason.as_deref(), Some("spam"));
    }

    #[tokio::test]
    async fn test_unflag_missing_record() {
        let mut repo = MockUrlRepository::new();
        repo.expect_set_flag().returning(|_, _, _| Ok(None));

        let err = service(repo)
            .unflag(5, &Identity::admin("root"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_rejects_bad_paging() {
        let mut repo = MockUrlRepository::new();
        repo.expect_list_by_owner().times(0);
        let service = service(repo);

        for (page, page_size) in [(0, 25), (1, 0), (1, MAX_PAGE_SIZE + 1)] {
            let query = ListQuery {
                page,
                page_size,
                ..ListQuery::default()
            };
            let err = service.list(OwnerFilter::Any, query).await.unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
        }
    }

    #[tokio::test]
    async fn test_list_delegates_to_store() {
        let mut repo = MockUrlRepository::new();
        repo.expect_list_by_owner()
            .withf(|owner, query| {
                *owner == OwnerFilter::User("u1".to_string()) && query.page == 2
            })
            .times(1)
            .returning(|_, _| Ok((vec![record(1, "mycode", Some("u1"))], 26)));

        let query = ListQuery {
            page: 2,
            ..ListQuery::default()
        };
        let (records, total) = service(repo)
            .list(OwnerFilter::User("u1".to_string()), query)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(total, 26);
    }

    #[tokio::test]
    async fn test_release_owner_requires_admin() {
        let mut repo = MockUrlRepository::new();
        repo.expect_clear_owner()
            .withf(|owner| owner == "u1")
            .times(1)
            .returning(|_| Ok(3));
        let service = service(repo);

        assert!(matches!(
            service.release_owner("u1", &Identity::user("u1")).await,
            Err(AppError::Forbidden { .. })
        ));
        assert_eq!(
            service
                .release_owner("u1", &Identity::admin("root"))
                .await
                .unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn test_flag_evicts_cached_target() {
        let w = wired().await;

        w.manage
            .flag(w.id, Some("phishing".to_string()), &Identity::admin("root"))
            .await
            .unwrap();

        assert_eq!(w.cache.slot("promo1"), Some(Slot::Tombstone));
        assert_eq!(
            w.resolve.resolve("promo1").await.unwrap(),
            Resolution::Flagged {
                reason: Some("phishing".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_unflag_restores_redirect() {
        let w = wired().await;
        let admin = Identity::admin("root");

        w.manage.flag(w.id, None, &admin).await.unwrap();
        w.manage.unflag(w.id, &admin).await.unwrap();

        assert_eq!(
            w.resolve.resolve("promo1").await.unwrap(),
            Resolution::Found("https://example.com/promo".to_string())
        );
    }

    #[tokio::test]
    async fn test_remove_evicts_cached_target() {
        let w = wired().await;

        assert!(w.manage.remove(w.id, &Identity::user("u1")).await.unwrap());

        assert_eq!(w.resolve.resolve("promo1").await.unwrap(), Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_edit_evicts_old_code() {
        let w = wired().await;

        w.manage
            .edit(w.id, "promo2", &Identity::user("u1"))
            .await
            .unwrap();

        assert_eq!(w.resolve.resolve("promo1").await.unwrap(), Resolution::NotFound);
        assert_eq!(
            w.resolve.resolve("promo2").await.unwrap(),
            Resolution::Found("https://example.com/promo".to_string())
        );
    }

    #[tokio::test]
    async fn test_invalidation_is_retried() {
        let mut repo = MockUrlRepository::new();
        repo.expect_set_flag()
            .returning(|id, flagged, _| {
                let mut r = record(id, "mycode", None);
                r.flagged = flagged;
                Ok(Some(r))
            });
        let repo = Arc::new(repo);
        let cache = Arc::new(FlakyInvalidation::new(1));
        let arbiter = CodeArbiter::new(
            repo.clone(),
            Arc::new(ScriptedCodes::new(&["unused"])),
            no_jitter(5),
        );
        let service = ManagementService::new(repo, Arc::new(arbiter), cache.clone());

        service.flag(1, None, &Identity::admin("root")).await.unwrap();

        assert_eq!(cache.attempts(), 2);
    }

    #[tokio::test]
    async fn test_persistent_invalidation_failure_keeps_store_write() {
        let mut repo = MockUrlRepository::new();
        repo.expect_set_flag()
            .times(1)
            .returning(|id, flagged, _| {
                let mut r = record(id, "mycode", None);
                r.flagged = flagged;
                Ok(Some(r))
            });
        let repo = Arc::new(repo);
        let cache = Arc::new(FlakyInvalidation::new(usize::MAX));
        let arbiter = CodeArbiter::new(
            repo.clone(),
            Arc::new(ScriptedCodes::new(&["unused"])),
            no_jitter(5),
        );
        let service = ManagementService::new(repo, Arc::new(arbiter), cache.clone());

        let flagged = service.flag(1, None, &Identity::admin("root")).await.unwrap();

        assert!(flagged.flagged);
        assert_eq!(cache.attempts(), 1 + INVALIDATION_RETRIES);
    }
}
