//! Cache service trait and error types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// How long an invalidated code refuses new fills.
///
/// Must exceed the time between a resolver's store read and its cache fill.
pub const TOMBSTONE_TTL_SECONDS: u64 = 30;

/// What a cache hit needs to redirect and count the click.
///
/// Flagged records are never cached, so a hit is always a live target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTarget {
    pub id: i64,
    pub original_url: String,
}

/// Trait for caching resolved short codes.
///
/// Implementations must be thread-safe and fail open on reads: a cache problem
/// degrades to a store lookup, never to a failed redirect.
///
/// A fill never overwrites an existing key, and invalidation leaves a
/// tombstone for [`TOMBSTONE_TTL_SECONDS`]. Together these stop a resolver
/// that read the store before a write from caching the stale record after
/// the write's invalidation.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Looks up a cached target for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(target))` on cache hit
    /// - `Ok(None)` on cache miss or error (fail-open behavior)
    async fn get_target(&self, short_code: &str) -> CacheResult<Option<CachedTarget>>;

    /// Stores a target with optional TTL (implementation default if `None`).
    ///
    /// Does nothing if the key already holds a target or a tombstone.
    async fn set_target(
        &self,
        short_code: &str,
        target: &CachedTarget,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Replaces any cached target with a tombstone. Used when a record is
    /// edited, flagged, unflagged or deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::OperationError`] if the tombstone was not written.
    async fn invalidate(&self, short_code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Human-readable backend name for health reports.
    fn backend(&self) -> &'static str;
}
