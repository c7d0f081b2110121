//! Redis-backed cache implementation.

use super::service::{
    CacheError, CacheResult, CacheService, CachedTarget, TOMBSTONE_TTL_SECONDS,
};
use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, ExistenceCheck, SetExpiry, SetOptions, aio::ConnectionManager,
};
use tracing::{debug, error, info, warn};

/// Value stored under an invalidated key. Never valid JSON for a target.
const TOMBSTONE: &str = "-";

/// Redis cache for resolved short codes.
///
/// Values are JSON-encoded [`CachedTarget`]s under `url:{code}`. Fills use
/// `SET NX EX`; invalidation overwrites the key with a [`TOMBSTONE`].
/// Reads and fills are fail-open; invalidation errors propagate.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and configures the default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "url:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, short_code: &str) -> String {
        format!("{}{}", self.key_prefix, short_code)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_target(&self, short_code: &str) -> CacheResult<Option<CachedTarget>> {
        let key = self.build_key(short_code);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) if raw == TOMBSTONE => {
                debug!("Cache TOMBSTONE: {}", short_code);
                Ok(None)
            }
            Ok(Some(raw)) => match serde_json::from_str::<CachedTarget>(&raw) {
                Ok(target) => {
                    debug!("Cache HIT: {}", short_code);
                    Ok(Some(target))
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry for {}: {}", short_code, e);
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!("Cache MISS: {}", short_code);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", short_code, e);
                Ok(None)
            }
        }
    }

    async fn set_target(
        &self,
        short_code: &str,
        target: &CachedTarget,
        ttl: Option<u64>,
    ) -> CacheResult<()> {
        let key = self.build_key(short_code);
        let mut conn = self.client.clone();
        let ttl_seconds = ttl.unwrap_or(self.default_ttl);

        let payload = serde_json::to_string(target)
            .map_err(|e| CacheError::OperationError(format!("Failed to encode target: {}", e)))?;

        let options = SetOptions::default()
            .conditional_set(ExistenceCheck::NX)
            .with_expiration(SetExpiry::EX(ttl_seconds));

        match conn
            .set_options::<_, _, Option<String>>(&key, payload, options)
            .await
        {
            Ok(Some(_)) => {
                debug!("Cache SET: {} (TTL: {}s)", short_code, ttl_seconds);
                Ok(())
            }
            Ok(None) => {
                debug!("Cache SET skipped, key present: {}", short_code);
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", short_code, e);
                Ok(())
            }
        }
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        let key = self.build_key(short_code);
        let mut conn = self.client.clone();

        match conn
            .set_ex::<_, _, ()>(&key, TOMBSTONE, TOMBSTONE_TTL_SECONDS)
            .await
        {
            Ok(()) => {
                debug!("Cache INVALIDATE: {}", short_code);
                Ok(())
            }
            Err(e) => {
                warn!("Redis invalidation error for {}: {}", short_code, e);
                Err(CacheError::OperationError(format!(
                    "Failed to invalidate {}: {}",
                    short_code, e
                )))
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
