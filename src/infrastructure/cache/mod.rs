//! Read-through cache for code resolution.
//!
//! Only live (unflagged) targets are ever cached. Writes to a record
//! invalidate its code, leaving a tombstone that blocks late fills. A cache
//! read failure degrades to a store lookup.

mod null_cache;
mod redis_cache;
mod service;

pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService, CachedTarget, TOMBSTONE_TTL_SECONDS};

#[cfg(test)]
pub(crate) mod testing;
