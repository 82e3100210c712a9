//! News aggregation for newsdesk.
//!
//! This module provides:
//! - Source fetchers for RSS/Atom feeds and the headline API
//! - Normalization of loosely-typed payloads into [`NormalizedItem`]
//! - Deduplicating article storage
//! - The fetch cycle tying them together

mod feed;
mod fetcher;
mod headline;
mod raw;
mod repository;
mod service;
mod types;

pub use feed::{parse_feed_items, FeedFetcher};
pub use fetcher::{
    parse_http_url, read_body_limited, validate_url, FetchError, HttpSettings, SourceFetcher,
    USER_AGENT,
};
pub use headline::{parse_headlines, HeadlineApiFetcher, PAGE_SIZE};
pub use raw::{coerce, coerce_first, RawText};
pub use repository::ArticleRepository;
pub use service::{fetch_latest, sources_from_config, FetchOrchestrator, LatestFetch};
pub use types::{
    truncate_chars, FetchReport, NormalizedItem, StoredArticle, DEFAULT_API_SOURCE,
    DEFAULT_FEED_SOURCE, DEFAULT_PAGE_SIZE, LATEST_ARTICLES_LIMIT, MAX_SOURCE_LENGTH,
    MAX_SUMMARY_LENGTH, MAX_TITLE_LENGTH,
};
