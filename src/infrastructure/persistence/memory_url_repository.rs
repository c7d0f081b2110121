//! In-process implementation of the URL repository.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::{
    CodeUpdate, ListQuery, OwnerFilter, SortDir, SortKey, UrlRepository, UrlSummary,
};
use crate::error::AppError;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    records: BTreeMap<i64, UrlRecord>,
    /// short_code -> id
    codes: HashMap<String, i64>,
}

/// Memory-backed repository for development and tests.
///
/// Both indexes live behind a single lock, so every operation is linearizable,
/// including the check-and-insert on short codes. Ids start at 1 and are never
/// reused, even after deletes. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryUrlRepository {
    state: RwLock<State>,
}

impl MemoryUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, AppError> {
        self.state.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, AppError> {
        self.state.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> AppError {
    AppError::storage_unavailable("In-memory store is poisoned", json!({}))
}

fn matches_owner(record: &UrlRecord, owner: &OwnerFilter) -> bool {
    match owner {
        OwnerFilter::Any => true,
        OwnerFilter::User(id) => record.owner_id.as_deref() == Some(id.as_str()),
        OwnerFilter::Anonymous => record.owner_id.is_none(),
    }
}

fn matches_search(record: &UrlRecord, needle: &str) -> bool {
    record.original_url.to_lowercase().contains(needle)
        || record.short_code.to_lowercase().contains(needle)
}

fn compare(a: &UrlRecord, b: &UrlRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::Clicks => a.clicks.cmp(&b.clicks),
        SortKey::ShortCode => a.short_code.cmp(&b.short_code),
    }
}

#[async_trait]
impl UrlRepository for MemoryUrlRepository {
    async fn insert_if_absent(
        &self,
        new_record: NewUrlRecord,
    ) -> Result<Option<UrlRecord>, AppError> {
        let mut state = self.write()?;

        if state.codes.contains_key(&new_record.short_code) {
            return Ok(None);
        }

        state.next_id += 1;
        let id = state.next_id;
        let now = Utc::now();

        let record = UrlRecord {
            id,
            original_url: new_record.original_url,
            short_code: new_record.short_code,
            created_at: now,
            updated_at: now,
            clicks: 0,
            owner_id: new_record.owner_id,
            flagged: false,
            flag_reason: None,
        };

        state.codes.insert(record.short_code.clone(), id);
        state.records.insert(id, record.clone());

        Ok(Some(record))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, AppError> {
        let state = self.read()?;
        Ok(state
            .codes
            .get(code)
            .and_then(|id| state.records.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UrlRecord>, AppError> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner: OwnerFilter,
        query: ListQuery,
    ) -> Result<(Vec<UrlRecord>, i64), AppError> {
        let state = self.read()?;
        let needle = query.search_term().map(str::to_lowercase);

        let mut matched: Vec<&UrlRecord> = state
            .records
            .values()
            .filter(|r| matches_owner(r, &owner))
            .filter(|r| needle.as_deref().is_none_or(|n| matches_search(r, n)))
            .collect();

        matched.sort_by(|a, b| {
            let ordering = compare(a, b, query.sort_by).then_with(|| a.id.cmp(&b.id));
            match query.sort_dir {
                SortDir::Asc => ordering,
                SortDir::Desc => ordering.reverse(),
            }
        });

        let total = matched.len() as i64;
        let (offset, limit) = query.offset_limit();

        let page = matched
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn increment_clicks(&self, id: i64) -> Result<bool, AppError> {
        let mut state = self.write()?;
        match state.records.get_mut(&id) {
            Some(record) => {
                record.clicks += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_code(&self, id: i64, new_code: &str) -> Result<CodeUpdate, AppError> {
        let mut state = self.write()?;

        let Some(current_code) = state.records.get(&id).map(|r| r.short_code.clone()) else {
            return Ok(CodeUpdate::NotFound);
        };

        if current_code == new_code {
            return Ok(state
                .records
                .get(&id)
                .cloned()
                .map_or(CodeUpdate::NotFound, CodeUpdate::Updated));
        }

        if state.codes.contains_key(new_code) {
            return Ok(CodeUpdate::Taken);
        }

        state.codes.remove(&current_code);
        state.codes.insert(new_code.to_string(), id);

        match state.records.get_mut(&id) {
            Some(record) => {
                record.short_code = new_code.to_string();
                record.updated_at = Utc::now();
                Ok(CodeUpdate::Updated(record.clone()))
            }
            None => Ok(CodeUpdate::NotFound),
        }
    }

    async fn set_flag(
        &self,
        id: i64,
        flagged: bool,
        reason: Option<String>,
    ) -> Result<Option<UrlRecord>, AppError> {
        let mut state = self.write()?;
        Ok(state.records.get_mut(&id).map(|record| {
            record.flagged = flagged;
            record.flag_reason = if flagged { reason } else { None };
            record.updated_at = Utc::now();
            record.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut state = self.write()?;
        match state.records.remove(&id) {
            Some(record) => {
                state.codes.remove(&record.short_code);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_owner(&self, owner_id: &str) -> Result<u64, AppError> {
        let mut state = self.write()?;
        let now = Utc::now();
        let mut released = 0;

        for record in state.records.values_mut() {
            if record.owner_id.as_deref() == Some(owner_id) {
                record.owner_id = None;
                record.updated_at = now;
                released += 1;
            }
        }

        Ok(released)
    }

    async fn summary(&self) -> Result<UrlSummary, AppError> {
        let state = self.read()?;
        let mut summary = UrlSummary::default();

        for record in state.records.values() {
            summary.total_urls += 1;
            summary.total_clicks += record.clicks;
            if record.flagged {
                summary.flagged_urls += 1;
            }
            if record.owner_id.is_none() {
                summary.anonymous_urls += 1;
            }
        }

        Ok(summary)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }
}
