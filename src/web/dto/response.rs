//! Response DTOs for the web API.

use serde::Serialize;

use crate::news::{FetchReport, StoredArticle};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    /// Response data.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PaginationMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Create a new paginated response.
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            data,
            meta: PaginationMeta {
                page,
                per_page,
                total,
            },
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u64,
}

// ============================================================================
// Article DTOs
// ============================================================================

/// An article as returned by the API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArticleResponse {
    /// Article title.
    pub title: String,
    /// Article summary.
    pub summary: String,
    /// Source label.
    pub source: String,
    /// Article URL.
    pub url: String,
    /// Publication time (RFC 3339).
    pub published_at: String,
}

impl From<StoredArticle> for ArticleResponse {
    fn from(article: StoredArticle) -> Self {
        Self {
            title: article.title,
            summary: article.summary,
            source: article.source,
            url: article.url,
            published_at: article.published_at.to_rfc3339(),
        }
    }
}

/// Result of `POST /api/fetch`.
#[derive(Debug, Serialize)]
pub struct FetchResponse {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Items returned by all sources.
    pub fetched: usize,
    /// Items newly stored.
    pub created: u64,
    /// Most recent articles after the fetch.
    pub latest: Vec<ArticleResponse>,
}

impl FetchResponse {
    /// Build the response from a fetch cycle.
    pub fn new(report: FetchReport, latest: Vec<StoredArticle>) -> Self {
        Self {
            status: "ok",
            fetched: report.fetched,
            created: report.created,
            latest: latest.into_iter().map(ArticleResponse::from).collect(),
        }
    }
}
