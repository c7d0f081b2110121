//! Short code claiming under concurrent creators.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::{CodeUpdate, UrlRepository};
use crate::error::AppError;
use crate::utils::code_generator::CodeSource;

/// Default bound on random-code claim attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default upper bound for the pause between random-code attempts.
pub const DEFAULT_RETRY_JITTER_MS: u64 = 5;

/// Retry policy for random-code claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePolicy {
    pub max_attempts: u32,
    /// Upper bound of the random pause before a retry. `0` retries at once.
    pub retry_jitter_ms: u64,
}

impl Default for CodePolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_jitter_ms: DEFAULT_RETRY_JITTER_MS,
        }
    }
}

/// How the code for a new record is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimMode {
    /// Draw codes from the code source, silently retrying on collision.
    Random,
    /// Claim exactly this code or fail with `CodeTaken`.
    Custom(String),
}

/// Resolves races for the short-code namespace.
///
/// All arbitration goes through the store's atomic insert-if-absent, so it
/// holds across any number of processes sharing the store. Random codes are
/// regenerated on conflict up to [`CodePolicy::max_attempts`]; requested
/// codes are never substituted.
pub struct CodeArbiter<R: UrlRepository + ?Sized> {
    repository: Arc<R>,
    codes: Arc<dyn CodeSource>,
    policy: CodePolicy,
}

impl<R: UrlRepository + ?Sized> CodeArbiter<R> {
    pub fn new(repository: Arc<R>, codes: Arc<dyn CodeSource>, policy: CodePolicy) -> Self {
        Self {
            repository,
            codes,
            policy: CodePolicy {
                max_attempts: policy.max_attempts.max(1),
                ..policy
            },
        }
    }

    pub fn policy(&self) -> CodePolicy {
        self.policy
    }

    /// Inserts a new record under a code chosen by `mode`.
    ///
    /// # Errors
    ///
    /// - [`AppError::CodeTaken`] if a custom code is already held
    /// - [`AppError::GenerationExhausted`] if every random attempt collided
    /// - [`AppError::StorageUnavailable`] / [`AppError::Internal`] from the store
    pub async fn claim(
        &self,
        original_url: String,
        owner_id: Option<String>,
        mode: ClaimMode,
    ) -> Result<UrlRecord, AppError> {
        match mode {
            ClaimMode::Custom(code) => {
                let new_record = NewUrlRecord {
                    original_url,
                    short_code: code.clone(),
                    owner_id,
                };

                match self.repository.insert_if_absent(new_record).await? {
                    Some(record) => Ok(record),
                    None => Err(AppError::code_taken(
                        "Short code is already in use",
                        json!({ "code": code }),
                    )),
                }
            }
            ClaimMode::Random => self.claim_random(original_url, owner_id).await,
        }
    }

    async fn claim_random(
        &self,
        original_url: String,
        owner_id: Option<String>,
    ) -> Result<UrlRecord, AppError> {
        for attempt in 1..=self.policy.max_attempts {
            let code = self.codes.next_code()?;
            let new_record = NewUrlRecord {
                original_url: original_url.clone(),
                short_code: code.clone(),
                owner_id: owner_id.clone(),
            };

            if let Some(record) = self.repository.insert_if_absent(new_record).await? {
                return Ok(record);
            }

            metrics::counter!("short_code_collisions_total").increment(1);
            debug!(attempt, code = %code, "Generated code collided, regenerating");

            if attempt < self.policy.max_attempts {
                self.pause().await;
            }
        }

        metrics::counter!("short_code_generation_exhausted_total").increment(1);
        warn!(
            attempts = self.policy.max_attempts,
            "Could not claim a generated short code"
        );

        Err(AppError::generation_exhausted(
            "Could not allocate a short code, try again",
            json!({ "attempts": self.policy.max_attempts }),
        ))
    }

    /// Moves an existing record to `new_code`.
    ///
    /// Re-claiming the record's own current code succeeds without a write.
    ///
    /// # Errors
    ///
    /// - [`AppError::CodeTaken`] if another record holds `new_code`
    /// - [`AppError::NotFound`] if the record vanished meanwhile
    pub async fn reclaim(&self, record: &UrlRecord, new_code: &str) -> Result<UrlRecord, AppError> {
        if record.short_code == new_code {
            return Ok(record.clone());
        }

        match self.repository.update_code(record.id, new_code).await? {
            CodeUpdate::Updated(updated) => Ok(updated),
            CodeUpdate::Taken => Err(AppError::code_taken(
                "Short code is already in use",
                json!({ "code": new_code }),
            )),
            CodeUpdate::NotFound => Err(AppError::not_found(
                "URL not found",
                json!({ "id": record.id }),
            )),
        }
    }

    async fn pause(&self) {
        if self.policy.retry_jitter_ms == 0 {
            return;
        }
        let millis = rand::rng().random_range(0..=self.policy.retry_jitter_ms);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::domain::repositories::MockUrlRepository;
    use mockall::Sequence;

    fn arbiter(
        repo: MockUrlRepository,
        codes: &[&str],
        policy: CodePolicy,
    ) -> CodeArbiter<MockUrlRepository> {
        CodeArbiter::new(Arc::new(repo), Arc::new(ScriptedCodes::new(codes)), policy)
    }

    #[tokio::test]
    async fn test_random_claim_retries_after_collision() {
        let mut repo = MockUrlRepository::new();
        let mut seq = Sequence::new();

        repo.expect_insert_if_absent()
            .withf(|r| r.short_code == "aaaaaa")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        repo.expect_insert_if_absent()
            .withf(|r| r.short_code == "bbbbbb")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|r| Ok(Some(record_from(&r, 7))));

        let arbiter = arbiter(repo, &["aaaaaa", "bbbbbb"], no_jitter(5));
        let record = arbiter
            .claim("https://example.com".to_string(), None, ClaimMode::Random)
            .await
            .unwrap();

        assert_eq!(record.short_code, "bbbbbb");
        assert_eq!(record.id, 7);
    }

    #[tokio::test]
    async fn test_random_claim_exhausts_after_bound() {
        let mut repo = MockUrlRepository::new();
        repo.expect_insert_if_absent()
            .times(3)
            .returning(|_| Ok(None));

        let arbiter = arbiter(repo, &["aaaaaa"], no_jitter(3));
        let err = arbiter
            .claim("https://example.com".to_string(), None, ClaimMode::Random)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::GenerationExhausted { .. }));
    }

    #[tokio::test]
    async fn test_custom_claim_never_substitutes() {
        let mut repo = MockUrlRepository::new();
        repo.expect_insert_if_absent()
            .withf(|r| r.short_code == "mycode")
            .times(1)
            .returning(|_| Ok(None));

        let arbiter = arbiter(repo, &["zzzzzz"], no_jitter(5));
        let err = arbiter
            .claim(
                "https://b.com".to_string(),
                Some("u2".to_string()),
                ClaimMode::Custom("mycode".to_string()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::CodeTaken { .. }));
    }

    #[tokio::test]
    async fn test_storage_error_is_not_retried() {
        let mut repo = MockUrlRepository::new();
        repo.expect_insert_if_absent()
            .times(1)
            .returning(|_| Err(AppError::storage_unavailable("down", json!({}))));

        let arbiter = arbiter(repo, &["aaaaaa"], no_jitter(5));
        let err = arbiter
            .claim("https://example.com".to_string(), None, ClaimMode::Random)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StorageUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_reclaim_same_code_skips_store() {
        let mut repo = MockUrlRepository::new();
        repo.expect_update_code().times(0);

        let arbiter = arbiter(repo, &["aaaaaa"], no_jitter(5));
        let current = record(1, "mycode", Some("u1"));
        let result = arbiter.reclaim(&current, "mycode").await.unwrap();

        assert_eq!(result, current);
    }

    #[tokio::test]
    async fn test_reclaim_taken_code() {
        let mut repo = MockUrlRepository::new();
        repo.expect_update_code()
            .withf(|id, code| *id == 1 && code == "other")
            .times(1)
            .returning(|_, _| Ok(CodeUpdate::Taken));

        let arbiter = arbiter(repo, &["aaaaaa"], no_jitter(5));
        let err = arbiter
            .reclaim(&record(1, "mycode", Some("u1")), "other")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::CodeTaken { .. }));
    }

    #[test]
    fn test_zero_attempts_is_raised_to_one() {
        let arbiter = arbiter(MockUrlRepository::new(), &["aaaaaa"], no_jitter(0));
        assert_eq!(arbiter.policy().max_attempts, 1);
    }
}
