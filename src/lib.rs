//! newsdesk - news aggregator
//!
//! Fetches RSS/Atom feeds and a headline API, normalizes their articles and
//! stores each one once, no matter how often it is fetched.

pub mod cli;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod news;
pub mod web;

pub use config::Config;
pub use db::{Database, DbPool};
pub use error::{NewsdeskError, Result};
pub use news::{
    fetch_latest, sources_from_config, ArticleRepository, FeedFetcher, FetchError,
    FetchOrchestrator, FetchReport, HeadlineApiFetcher, LatestFetch, NormalizedItem,
    SourceFetcher, StoredArticle,
};
pub use web::WebServer;
