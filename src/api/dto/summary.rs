//! DTO for the admin overview.

use serde::Serialize;

use crate::domain::repositories::UrlSummary;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub total_urls: i64,
    pub total_clicks: i64,
    pub flagged_urls: i64,
    pub anonymous_urls: i64,
}

impl From<UrlSummary> for SummaryResponse {
    fn from(summary: UrlSummary) -> Self {
        Self {
            total_urls: summary.total_urls,
            total_clicks: summary.total_clicks,
            flagged_urls: summary.flagged_urls,
            anonymous_urls: summary.anonymous_urls,
        }
    }
}
