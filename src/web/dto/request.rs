//! Request DTOs for the web API.

use serde::Deserialize;

use crate::news::DEFAULT_PAGE_SIZE;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Pagination query parameters (`?page=&per_page=`).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationQuery {
    /// Page number, starting at 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationQuery {
    /// Clamp page to at least 1 and per_page to 1..=100.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// Lookup query for `GET /api/articles/by-url`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleLookupQuery {
    /// Exact article URL.
    pub url: Option<String>,
}

impl ArticleLookupQuery {
    /// The trimmed URL, or `None` when missing or blank.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }
}
