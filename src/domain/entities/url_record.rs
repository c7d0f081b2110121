//! URL record entity: the mapping from a short code to its target.

use chrono::{DateTime, Utc};

/// A stored short-code mapping with usage and moderation state.
///
/// `id` is assigned by the store and never changes. `clicks` only grows,
/// and only through [`crate::domain::repositories::UrlRepository::increment_clicks`].
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UrlRecord {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub clicks: i64,
    pub owner_id: Option<String>,
    pub flagged: bool,
    pub flag_reason: Option<String>,
}

impl UrlRecord {
    /// Returns true if the record has no owning user.
    pub fn is_anonymous(&self) -> bool {
        self.owner_id.is_none()
    }

    /// Returns true if `user_id` owns this record.
    ///
    /// An anonymous record is owned by nobody.
    pub fn is_owned_by(&self, user_id: Option<&str>) -> bool {
        match (self.owner_id.as_deref(), user_id) {
            (Some(owner), Some(user)) => owner == user,
            _ => false,
        }
    }
}

/// Input data for creating a new record.
///
/// The store fills in `id`, timestamps, `clicks = 0` and `flagged = false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrlRecord {
    pub original_url: String,
    pub short_code: String,
    pub owner_id: Option<String>,
}
