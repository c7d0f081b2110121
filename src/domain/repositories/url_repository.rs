//! Repository trait for URL record storage.

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::error::AppError;
use async_trait::async_trait;

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Columns a listing may be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Clicks,
    ShortCode,
}

impl SortKey {
    /// SQL column for this key. Only ever interpolated from this whitelist.
    pub fn column(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::Clicks => "clicks",
            SortKey::ShortCode => "short_code",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Which owners a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerFilter {
    /// Every record (admin view).
    Any,
    /// Records owned by one user.
    User(String),
    /// Records with no owner.
    Anonymous,
}

/// Search, pagination and ordering for [`UrlRepository::list_by_owner`].
///
/// `page` is 1-indexed. `search` is a case-insensitive substring matched
/// against `original_url` and `short_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortKey,
    pub sort_dir: SortDir,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortKey::default(),
            sort_dir: SortDir::default(),
        }
    }
}

impl ListQuery {
    /// Returns the `(offset, limit)` pair for this page.
    pub fn offset_limit(&self) -> (i64, i64) {
        let page = self.page.max(1) as i64;
        let limit = self.page_size.max(1) as i64;
        ((page - 1) * limit, limit)
    }

    /// Search term with surrounding whitespace removed, `None` if empty.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Outcome of [`UrlRepository::update_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeUpdate {
    Updated(UrlRecord),
    /// Another record already holds the requested code.
    Taken,
    NotFound,
}

/// Aggregate counters for the admin overview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlSummary {
    pub total_urls: i64,
    pub total_clicks: i64,
    pub flagged_urls: i64,
    pub anonymous_urls: i64,
}

/// Durable storage for URL records.
///
/// Every uniqueness-sensitive operation (`insert_if_absent`, `update_code`)
/// is linearizable with respect to the others: two concurrent claims of the
/// same code never both succeed.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::MemoryUrlRepository`] - in-process
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Atomically inserts a record unless its short code is already held.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` with the fully populated record on success
    /// - `Ok(None)` if the code is taken; nothing is written
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StorageUnavailable`] on connection failures.
    async fn insert_if_absent(&self, new_record: NewUrlRecord)
    -> Result<Option<UrlRecord>, AppError>;

    /// Finds a record by its short code (case-sensitive).
    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UrlRecord>, AppError>;

    /// Lists one page of records plus the total number of matches.
    async fn list_by_owner(
        &self,
        owner: OwnerFilter,
        query: ListQuery,
    ) -> Result<(Vec<UrlRecord>, i64), AppError>;

    /// Atomically adds one click. Does not touch `updated_at`.
    ///
    /// Returns `Ok(false)` if the record no longer exists.
    async fn increment_clicks(&self, id: i64) -> Result<bool, AppError>;

    /// Atomically moves a record to a new short code, re-checking uniqueness.
    ///
    /// Refreshes `updated_at` on success.
    async fn update_code(&self, id: i64, new_code: &str) -> Result<CodeUpdate, AppError>;

    /// Sets the moderation state. `reason` is stored only when flagging.
    ///
    /// Returns the updated record, or `Ok(None)` if it does not exist.
    async fn set_flag(
        &self,
        id: i64,
        flagged: bool,
        reason: Option<String>,
    ) -> Result<Option<UrlRecord>, AppError>;

    /// Hard-deletes a record, freeing its short code.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Clears `owner_id` on every record of a removed user.
    ///
    /// Records are never deleted by this operation. Returns the number of
    /// records released.
    async fn clear_owner(&self, owner_id: &str) -> Result<u64, AppError>;

    async fn summary(&self) -> Result<UrlSummary, AppError>;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<(), AppError>;
}
