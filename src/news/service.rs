//! Fetch orchestration for newsdesk.
//!
//! One fetch cycle runs every configured source, merges their items and hands
//! the whole batch to the store in a single call.

use futures::future::join_all;
use tracing::{info, warn};

use super::feed::FeedFetcher;
use super::fetcher::SourceFetcher;
use super::headline::HeadlineApiFetcher;
use super::repository::ArticleRepository;
use super::types::{FetchReport, NormalizedItem, StoredArticle, LATEST_ARTICLES_LIMIT};
use crate::config::NewsConfig;
use crate::db::Database;
use crate::Result;

/// Result of a fetch cycle together with the newest stored articles.
#[derive(Debug, Clone)]
pub struct LatestFetch {
    /// Counts from the cycle.
    pub report: FetchReport,
    /// Most recent articles after the cycle, newest first.
    pub latest: Vec<StoredArticle>,
}

/// Runs fetch cycles against a database.
pub struct FetchOrchestrator<'a> {
    db: &'a Database,
}

impl<'a> FetchOrchestrator<'a> {
    /// Create a new FetchOrchestrator with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Run every source and store the merged batch.
    ///
    /// A source that fails is logged and contributes nothing; the cycle only
    /// fails when the store does.
    pub async fn run_fetch(&self, sources: &[Box<dyn SourceFetcher>]) -> Result<FetchReport> {
        let results = join_all(sources.iter().map(|source| source.fetch())).await;

        let mut items: Vec<NormalizedItem> = Vec::new();
        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(source_items) => {
                    info!(source = source.name(), count = source_items.len(), "Source fetched");
                    items.extend(source_items);
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Source failed, skipping");
                }
            }
        }

        let repo = ArticleRepository::new(self.db.pool());
        let created = repo.bulk_save_unique(&items).await?;

        let report = FetchReport {
            fetched: items.len(),
            created,
        };
        info!(
            fetched = report.fetched,
            created = report.created,
            "Fetch cycle complete"
        );
        Ok(report)
    }

    /// Run one cycle over the configured sources and return the newest articles.
    pub async fn fetch_latest(&self, config: &NewsConfig) -> Result<LatestFetch> {
        let sources = sources_from_config(config)?;
        let report = self.run_fetch(&sources).await?;
        let latest = ArticleRepository::new(self.db.pool())
            .list_latest(LATEST_ARTICLES_LIMIT)
            .await?;

        Ok(LatestFetch { report, latest })
    }
}

/// Build the source list described by the configuration.
///
/// The headline API source is only included when an API key is configured.
pub fn sources_from_config(config: &NewsConfig) -> Result<Vec<Box<dyn SourceFetcher>>> {
    let mut sources: Vec<Box<dyn SourceFetcher>> = Vec::new();

    if !config.feeds.is_empty() {
        sources.push(Box::new(FeedFetcher::from_config(config)?));
    }

    if let Some(api) = HeadlineApiFetcher::from_config(config)? {
        sources.push(Box::new(api));
    }

    Ok(sources)
}

/// Run one fetch cycle for `db` using `config`.
pub async fn fetch_latest(db: &Database, config: &NewsConfig) -> Result<LatestFetch> {
    FetchOrchestrator::new(db).fetch_latest(config).await
}
