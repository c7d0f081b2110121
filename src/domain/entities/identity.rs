//! Caller identity resolved by the surrounding auth layer.

use crate::domain::entities::UrlRecord;

/// The current caller, as supplied by an upstream collaborator.
///
/// This crate never authenticates. `user_id = None` is an anonymous visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub is_admin: bool,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            is_admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            is_admin: true,
        }
    }

    /// Owner or admin.
    pub fn can_manage(&self, record: &UrlRecord) -> bool {
        self.is_admin || record.is_owned_by(self.user_id.as_deref())
    }
}
