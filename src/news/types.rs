//! News types for newsdesk.

use chrono::{DateTime, Utc};

/// Maximum stored length of an article title, in characters.
pub const MAX_TITLE_LENGTH: usize = 500;

/// Maximum stored length of a source label, in characters.
pub const MAX_SOURCE_LENGTH: usize = 255;

/// Maximum length of a feed item summary, in characters.
pub const MAX_SUMMARY_LENGTH: usize = 10000;

/// Number of articles returned after a fetch cycle.
pub const LATEST_ARTICLES_LIMIT: usize = 20;

/// Default page size for article listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Source label used when a feed declares no title.
pub const DEFAULT_FEED_SOURCE: &str = "RSS";

/// Source label used when a headline has no source name.
pub const DEFAULT_API_SOURCE: &str = "NewsAPI";

/// An article as produced by a fetcher, before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedItem {
    /// Article title (non-empty, trimmed).
    pub title: String,
    /// Article summary (may be empty).
    pub summary: String,
    /// Label of the feed or API the article came from.
    pub source: String,
    /// Absolute article URL.
    pub url: String,
    /// Publication time, or fetch time when the source gave none.
    pub published_at: DateTime<Utc>,
}

impl NormalizedItem {
    /// Create a new item with an empty summary.
    pub fn new(
        title: impl Into<String>,
        source: impl Into<String>,
        url: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            summary: String::new(),
            source: source.into(),
            url: url.into(),
            published_at,
        }
    }

    /// Set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }
}

/// A persisted article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArticle {
    /// Article ID.
    pub id: i64,
    /// Article title (at most [`MAX_TITLE_LENGTH`] characters).
    pub title: String,
    /// Article summary.
    pub summary: String,
    /// Source label (at most [`MAX_SOURCE_LENGTH`] characters).
    pub source: String,
    /// Article URL (unique).
    pub url: String,
    /// Publication time.
    pub published_at: DateTime<Utc>,
    /// When the row was inserted.
    pub created_at: DateTime<Utc>,
}

/// Outcome of one fetch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Items returned by all sources together.
    pub fetched: usize,
    /// Items that were new to the store.
    pub created: u64,
}

/// Truncate a string to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_item_builder() {
        let now = Utc::now();
        let item = NormalizedItem::new("Title", "Source", "https://example.com/a", now)
            .with_summary("Summary");
        assert_eq!(item.title, "Title");
        assert_eq!(item.summary, "Summary");
        assert_eq!(item.source, "Source");
        assert_eq!(item.url, "https://example.com/a");
        assert_eq!(item.published_at, now);
    }

    #[test]
    fn test_normalized_item_default_summary_is_empty() {
        let item = NormalizedItem::new("T", "S", "https://example.com", Utc::now());
        assert_eq!(item.summary, "");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        let text = "日本語のニュース";
        let truncated = truncate_chars(text, 3);
        assert_eq!(truncated, "日本語");
        assert_eq!(truncated.chars().count(), 3);
    }

    #[test]
    fn test_truncate_to_storage_limits() {
        let title = "t".repeat(MAX_TITLE_LENGTH + 50);
        assert_eq!(
            truncate_chars(&title, MAX_TITLE_LENGTH).chars().count(),
            MAX_TITLE_LENGTH
        );
        let source = "s".repeat(MAX_SOURCE_LENGTH + 1);
        assert_eq!(
            truncate_chars(&source, MAX_SOURCE_LENGTH).chars().count(),
            MAX_SOURCE_LENGTH
        );
    }
}
