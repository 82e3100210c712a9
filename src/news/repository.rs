//! Article repository for newsdesk.

use chrono::Utc;
use sqlx::QueryBuilder;
use tracing::debug;

use super::types::{truncate_chars, NormalizedItem, StoredArticle, MAX_SOURCE_LENGTH, MAX_TITLE_LENGTH};
use crate::datetime::{parse_db_timestamp, to_db_timestamp};
use crate::db::DbPool;
use crate::{NewsdeskError, Result};

/// Rows per INSERT statement, keeping bind parameters well under SQLite's limit.
const INSERT_CHUNK_SIZE: usize = 500;

/// Row type for an article from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    summary: String,
    source: String,
    url: String,
    published_at: String,
    created_at: String,
}

impl From<ArticleRow> for StoredArticle {
    fn from(row: ArticleRow) -> Self {
        StoredArticle {
            id: row.id,
            title: row.title,
            summary: row.summary,
            source: row.source,
            url: row.url,
            published_at: parse_db_timestamp(&row.published_at).unwrap_or_else(Utc::now),
            created_at: parse_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// A candidate row, already truncated to storage limits.
struct NewArticle {
    title: String,
    summary: String,
    source: String,
    url: String,
    published_at: String,
}

impl From<&NormalizedItem> for NewArticle {
    fn from(item: &NormalizedItem) -> Self {
        NewArticle {
            title: truncate_chars(&item.title, MAX_TITLE_LENGTH),
            summary: item.summary.clone(),
            source: truncate_chars(&item.source, MAX_SOURCE_LENGTH),
            url: item.url.clone(),
            published_at: to_db_timestamp(&item.published_at),
        }
    }
}

/// Repository for article operations.
pub struct ArticleRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ArticleRepository<'a> {
    /// Create a new ArticleRepository with the given database pool.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert every item not already stored and return how many were new.
    ///
    /// An item is a duplicate when its url, or its (title, source) pair after
    /// truncation, matches a stored row or an earlier item in the same batch.
    /// Duplicates are skipped silently. The whole batch commits atomically.
    pub async fn bulk_save_unique(&self, items: &[NormalizedItem]) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let candidates: Vec<NewArticle> = items.iter().map(NewArticle::from).collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        let mut created = 0;
        for chunk in candidates.chunks(INSERT_CHUNK_SIZE) {
            let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                "INSERT OR IGNORE INTO articles (title, summary, source, url, published_at) ",
            );
            query.push_values(chunk, |mut row, article| {
                row.push_bind(&article.title)
                    .push_bind(&article.summary)
                    .push_bind(&article.source)
                    .push_bind(&article.url)
                    .push_bind(&article.published_at);
            });

            let result = query
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| NewsdeskError::Database(e.to_string()))?;
            created += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        debug!(
            candidates = candidates.len(),
            created, "Bulk article save complete"
        );
        Ok(created)
    }

    /// Get the most recent articles, newest first.
    pub async fn list_latest(&self, limit: usize) -> Result<Vec<StoredArticle>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, summary, source, url, published_at, created_at
            FROM articles
            ORDER BY published_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(self.pool)
        .await
        .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(StoredArticle::from).collect())
    }

    /// Get one page of articles, newest first. Pages start at 1.
    pub async fn list_page(&self, page: u32, per_page: u32) -> Result<Vec<StoredArticle>> {
        if page == 0 || per_page == 0 {
            return Err(NewsdeskError::Validation(
                "page and per_page must be positive".to_string(),
            ));
        }
        let offset = (i64::from(page) - 1) * i64::from(per_page);

        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, summary, source, url, published_at, created_at
            FROM articles
            ORDER BY published_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(i64::from(per_page))
        .bind(offset)
        .fetch_all(self.pool)
        .await
        .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(StoredArticle::from).collect())
    }

    /// Count stored articles.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Get an article by its URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<StoredArticle>> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, summary, source, url, published_at, created_at
            FROM articles
            WHERE url = ?
            "#,
        )
        .bind(url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(row.map(StoredArticle::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::{DateTime, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    fn item(title: &str, source: &str, url: &str, day: u32) -> NormalizedItem {
        NormalizedItem::new(title, source, url, at(day))
    }

    #[tokio::test]
    async fn test_bulk_save_inserts_new_items() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ArticleRepository::new(db.pool());

        let items = vec![
            item("One", "Wire", "https://example.com/1", 1).with_summary("first"),
            item("Two", "Wire", "https://example.com/2", 2),
        ];
        let created = repo.bulk_save_unique(&items).await.unwrap();
        assert_eq!(created, 2);
        assert_eq!(repo.count().await.unwrap(), 2);

        let stored = repo
            .get_by_url("https://example.com/1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "One");
        assert_eq!(stored.summary, "first");
        assert_eq!(stored.source, "Wire");
        assert_eq!(stored.published_at, at(1));
    }

    #[tokio::test]
    async fn test_bulk_save_empty_batch() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ArticleRepository::new(db.pool());
        assert_eq!(repo.bulk_save_unique(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bulk_save_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ArticleRepository::new(db.pool());

        let items = vec![
            item("One", "Wire", "https://example.com/1", 1),
            item("Two", "Wire", "https://example.com/2", 2),
        ];
        assert_eq!(repo.bulk_save_unique(&items).await.unwrap(), 2);
        assert_eq!(repo.bulk_save_unique(&items).await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_url_is_skipped() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ArticleRepository::new(db.pool());

        repo.bulk_save_unique(&[item("Original", "A", "https://example.com/x", 1)])
            .await
            .unwrap();

        let created = repo
            .bulk_save_unique(&[
                item("Different title", "B", "https://example.com/x", 2),
                item("Fresh", "B", "https://example.com/y", 2),
            ])
            .await
            .unwrap();
        assert_eq!(created, 1);

        let stored = repo
            .get_by_url("https://example.com/x")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "Original");
    }

    #[tokio::test]
    async fn test_duplicate_title_source_is_skipped() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ArticleRepository::new(db.pool());

        let created = repo
            .bulk_save_unique(&[
                item("Same headline", "Wire", "https://example.com/a", 1),
                item("Same headline", "Wire", "https://example.com/b", 1),
                item("Same headline", "Other", "https://example.com/c", 1),
            ])
            .await
            .unwrap();
        assert_eq!(created, 2);
        assert!(repo
            .get_by_url("https://example.com/b")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_truncation_before_dedupe() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ArticleRepository::new(db.pool());

        let base = "t".repeat(MAX_TITLE_LENGTH);
        let long_a = format!("{base}-a");
        let long_b = format!("{base}-b");
        let source = "s".repeat(MAX_SOURCE_LENGTH + 10);

        let created = repo
            .bulk_save_unique(&[
                item(&long_a, &source, "https://example.com/a", 1),
                item(&long_b, &source, "https://example.com/b", 1),
            ])
            .await
            .unwrap();
        assert_eq!(created, 1);

        let stored = repo
            .get_by_url("https://example.com/a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title.chars().count(), MAX_TITLE_LENGTH);
        assert_eq!(stored.source.chars().count(), MAX_SOURCE_LENGTH);
    }

    #[tokio::test]
    async fn test_bulk_save_spans_chunks() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ArticleRepository::new(db.pool());

        let items: Vec<NormalizedItem> = (0..INSERT_CHUNK_SIZE + 25)
            .map(|i| {
                item(
                    &format!("Headline {i}"),
                    "Bulk",
                    &format!("https://example.com/{i}"),
                    1,
                )
            })
            .collect();

        let created = repo.bulk_save_unique(&items).await.unwrap();
        assert_eq!(created as usize, INSERT_CHUNK_SIZE + 25);
        assert_eq!(repo.count().await.unwrap() as usize, INSERT_CHUNK_SIZE + 25);
    }

    #[tokio::test]
    async fn test_list_latest_orders_by_published_at() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ArticleRepository::new(db.pool());

        repo.bulk_save_unique(&[
            item("Middle", "S", "https://example.com/m", 10),
            item("Oldest", "S", "https://example.com/o", 1),
            item("Newest", "S", "https://example.com/n", 20),
        ])
        .await
        .unwrap();

        let latest = repo.list_latest(2).await.unwrap();
        let titles: Vec<&str> = latest.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Newest", "Middle"]);
    }

    #[tokio::test]
    async fn test_list_page() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ArticleRepository::new(db.pool());

        let items: Vec<NormalizedItem> = (1..=5)
            .map(|d| item(&format!("Day {d}"), "S", &format!("https://example.com/{d}"), d))
            .collect();
        repo.bulk_save_unique(&items).await.unwrap();

        let page1 = repo.list_page(1, 2).await.unwrap();
        assert_eq!(page1[0].title, "Day 5");
        assert_eq!(page1[1].title, "Day 4");

        let page3 = repo.list_page(3, 2).await.unwrap();
        assert_eq!(page3.len(), 1);
        assert_eq!(page3[0].title, "Day 1");

        assert!(repo.list_page(4, 2).await.unwrap().is_empty());
        assert!(matches!(
            repo.list_page(0, 2).await,
            Err(NewsdeskError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_created_at_is_set() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ArticleRepository::new(db.pool());

        repo.bulk_save_unique(&[item("T", "S", "https://example.com/t", 1)])
            .await
            .unwrap();
        let stored = repo
            .get_by_url("https://example.com/t")
            .await
            .unwrap()
            .unwrap();
        assert!((Utc::now() - stored.created_at).num_seconds().abs() <= 5);
    }

    #[tokio::test]
    async fn test_get_by_url_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ArticleRepository::new(db.pool());
        assert!(repo
            .get_by_url("https://example.com/missing")
            .await
            .unwrap()
            .is_none());
    }
}
