//! Query parameters and response for the listing endpoint.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::api::dto::url_record::UrlResponse;
use crate::domain::repositories::{DEFAULT_PAGE_SIZE, ListQuery, SortDir, SortKey};

/// Sort column accepted in the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SortByParam {
    #[serde(rename = "createdAt", alias = "created_at")]
    CreatedAt,
    #[serde(rename = "clicks")]
    Clicks,
    #[serde(rename = "shortCode", alias = "short_code")]
    ShortCode,
}

impl From<SortByParam> for SortKey {
    fn from(value: SortByParam) -> Self {
        match value {
            SortByParam::CreatedAt => SortKey::CreatedAt,
            SortByParam::Clicks => SortKey::Clicks,
            SortByParam::ShortCode => SortKey::ShortCode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirParam {
    Asc,
    Desc,
}

impl From<SortDirParam> for SortDir {
    fn from(value: SortDirParam) -> Self {
        match value {
            SortDirParam::Asc => SortDir::Asc,
            SortDirParam::Desc => SortDir::Desc,
        }
    }
}

/// Listing query parameters.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
/// `owner` is honoured for admins only: a user id, or `anonymous`.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, alias = "page_size")]
    pub page_size: Option<u32>,

    #[serde(default)]
    pub search: Option<String>,

    #[serde(default, alias = "sort_by")]
    pub sort_by: Option<SortByParam>,

    #[serde(default, alias = "sort_dir")]
    pub sort_dir: Option<SortDirParam>,

    #[serde(default)]
    pub owner: Option<String>,
}

impl ListParams {
    /// Converts to a store query, filling defaults. Range checks happen in the service.
    pub fn to_query(&self) -> ListQuery {
        ListQuery {
            search: self.search.clone(),
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            sort_by: self.sort_by.map(SortKey::from).unwrap_or_default(),
            sort_dir: self.sort_dir.map(SortDir::from).unwrap_or_default(),
        }
    }
}

/// One page of records.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub items: Vec<UrlResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}
