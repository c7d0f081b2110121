//! Response body for a single URL record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::UrlRecord;

/// JSON representation of a [`UrlRecord`], with the rendered short URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlResponse {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub clicks: i64,
    pub owner_id: Option<String>,
    pub flagged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UrlResponse {
    pub fn from_record(record: UrlRecord, short_url: String) -> Self {
        Self {
            id: record.id,
            short_code: record.short_code,
            short_url,
            original_url: record.original_url,
            clicks: record.clicks,
            owner_id: record.owner_id,
            flagged: record.flagged,
            flag_reason: record.flag_reason,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
