//! Click event model for deferred click counting.

/// A resolved redirect whose click still has to be counted.
///
/// Sent from [`crate::application::services::ResolutionService`] to the
/// background worker over a bounded channel, so the redirect never waits for
/// the counter write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub url_id: i64,
    pub short_code: String,
}

impl ClickEvent {
    pub fn new(url_id: i64, short_code: impl Into<String>) -> Self {
        Self {
            url_id,
            short_code: short_code.into(),
        }
    }
}
