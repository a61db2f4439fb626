//! Page-number pagination for list endpoints
//!
//! Lists are served as `{count, next, previous, results}` where `next` and
//! `previous` are relative URLs that keep every other query parameter.

use axum::http::Uri;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

const INVALID_PAGE: &str = "Invalid page.";

/// Configured number of items per page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(pub u32);

/// A requested page, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Page 1 when `page` is absent; page 0 does not exist
    pub fn new(page: Option<u32>, PageSize(page_size): PageSize) -> Result<Self, ApiError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::NotFound(INVALID_PAGE.to_string()));
        }
        Ok(Self {
            page,
            page_size: page_size.max(1),
        })
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Number of pages for `count` items; an empty list still has page 1
    pub fn page_count(&self, count: u64) -> u64 {
        count.div_ceil(u64::from(self.page_size)).max(1)
    }
}

/// One slice of a listing plus the size of the whole listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// Paginated response body
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> PageResponse<T> {
    /// Build the response for `request`, linking siblings relative to `uri`
    pub fn build(page: Page<T>, request: PageRequest, uri: &Uri) -> Result<Self, ApiError> {
        let last = request.page_count(page.total);
        if u64::from(request.page) > last {
            return Err(ApiError::NotFound(INVALID_PAGE.to_string()));
        }

        let next = (u64::from(request.page) < last).then(|| page_link(uri, request.page + 1));
        let previous = (request.page > 1).then(|| page_link(uri, request.page - 1));

        Ok(Self {
            count: page.total,
            next,
            previous,
            results: page.items,
        })
    }
}

/// Relative link to `page`, keeping the other query parameters in order.
/// The link to page 1 carries no `page` parameter.
fn page_link(uri: &Uri, page: u32) -> String {
    let mut params: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some("page"))
        .map(str::to_string)
        .collect();
    if page > 1 {
        params.push(format!("page={}", page));
    }

    if params.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), params.join("&"))
    }
}
