//! In-process cache doubles for service tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::service::{CacheError, CacheResult, CacheService, CachedTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Target(CachedTarget),
    Tombstone,
}

/// Map-backed cache with the fill-only and tombstone rules of the real one.
/// Tombstones never expire here.
#[derive(Default)]
pub struct MapCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl MapCache {
    pub fn slot(&self, code: &str) -> Option<Slot> {
        self.slots.lock().unwrap().get(code).cloned()
    }

    pub fn target(&self, code: &str) -> Option<CachedTarget> {
        match self.slot(code) {
            Some(Slot::Target(target)) => Some(target),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().unwrap().is_empty()
    }

    /// Removes a tombstone, as if its TTL elapsed.
    pub fn expire(&self, code: &str) {
        self.slots.lock().unwrap().remove(code);
    }
}

#[async_trait]
impl CacheService for MapCache {
    async fn get_target(&self, code: &str) -> CacheResult<Option<CachedTarget>> {
        Ok(self.target(code))
    }

    async fn set_target(
        &self,
        code: &str,
        target: &CachedTarget,
        _ttl: Option<u64>,
    ) -> CacheResult<()> {
        self.slots
            .lock()
            .unwrap()
            .entry(code.to_string())
            .or_insert_with(|| Slot::Target(target.clone()));
        Ok(())
    }

    async fn invalidate(&self, code: &str) -> CacheResult<()> {
        self.slots
            .lock()
            .unwrap()
            .insert(code.to_string(), Slot::Tombstone);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "map"
    }
}

/// Cache whose invalidations fail `failures` times before succeeding.
pub struct FlakyInvalidation {
    failures: usize,
    attempts: AtomicUsize,
}

impl FlakyInvalidation {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheService for FlakyInvalidation {
    async fn get_target(&self, _code: &str) -> CacheResult<Option<CachedTarget>> {
        Ok(None)
    }

    async fn set_target(
        &self,
        _code: &str,
        _target: &CachedTarget,
        _ttl: Option<u64>,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn invalidate(&self, _code: &str) -> CacheResult<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            Err(CacheError::OperationError("connection reset".to_string()))
        } else {
            Ok(())
        }
    }

    async fn health_check(&self) -> bool {
        false
    }

    fn backend(&self) -> &'static str {
        "flaky"
    }
}
