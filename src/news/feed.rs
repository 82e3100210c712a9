//! RSS/Atom feed source.
//!
//! Feeds are fetched independently; a feed that cannot be reached or parsed is
//! logged and skipped, and an entry without a usable title or link is dropped.
//! Neither ever aborts the rest of the batch.

use async_trait::async_trait;
use feed_rs::model::{Entry, Feed, Link};
use feed_rs::parser;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, info, warn};

use super::fetcher::{
    parse_http_url, read_body_limited, validate_url, FetchError, HttpSettings, SourceFetcher,
};
use super::raw::{coerce_first, RawText};
use super::types::{truncate_chars, NormalizedItem, DEFAULT_FEED_SOURCE, MAX_SUMMARY_LENGTH};
use crate::config::NewsConfig;
use crate::datetime::{parse_feed_date_or_now, parse_feed_timestamp};

/// Fetches a list of RSS/Atom feeds.
pub struct FeedFetcher {
    client: Client,
    feeds: Vec<String>,
    source_label: Option<String>,
    max_feed_size: u64,
    max_concurrent: usize,
    allow_private_hosts: bool,
}

impl FeedFetcher {
    /// Create a fetcher for the given feeds with default limits.
    pub fn new(feeds: Vec<String>) -> Result<Self, FetchError> {
        Self::from_config(&NewsConfig {
            feeds,
            ..NewsConfig::default()
        })
    }

    /// Create a fetcher from the news configuration.
    pub fn from_config(config: &NewsConfig) -> Result<Self, FetchError> {
        let client = HttpSettings::for_feeds(config).build_client()?;
        Ok(Self {
            client,
            feeds: config.feeds.clone(),
            source_label: config
                .source_label
                .as_deref()
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_string),
            max_feed_size: config.max_feed_size_bytes,
            max_concurrent: config.max_concurrent_feeds.max(1),
            allow_private_hosts: config.allow_private_hosts,
        })
    }

    /// Use this label for every item instead of the feed's title.
    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self
    }

    /// Fetch and normalize a single feed.
    pub async fn fetch_one(&self, url: &str) -> Result<Vec<NormalizedItem>, FetchError> {
        if self.allow_private_hosts {
            parse_http_url(url)?;
        } else {
            validate_url(url)?;
        }

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let bytes = read_body_limited(response, self.max_feed_size).await?;
        parse_feed_items(&bytes, self.source_label.as_deref())
    }
}

#[async_trait]
impl SourceFetcher for FeedFetcher {
    fn name(&self) -> &str {
        "feeds"
    }

    async fn fetch(&self) -> Result<Vec<NormalizedItem>, FetchError> {
        let results: Vec<(&String, Result<Vec<NormalizedItem>, FetchError>)> = stream::iter(
            self.feeds
                .iter()
                .map(|url| async move { (url, self.fetch_one(url).await) })
                .collect::<Vec<_>>(),
        )
        .buffered(self.max_concurrent)
        .collect()
        .await;

        let mut items = Vec::new();
        for (url, result) in results {
            match result {
                Ok(feed_items) => {
                    debug!(feed = %url, count = feed_items.len(), "Feed fetched");
                    items.extend(feed_items);
                }
                Err(e) => {
                    warn!(feed = %url, error = %e, "Skipping feed");
                }
            }
        }

        info!(
            feeds = self.feeds.len(),
            items = items.len(),
            "Feed fetch complete"
        );
        Ok(items)
    }
}

/// Parse a feed document into normalized items.
///
/// `source_label` overrides the feed's own title as the item source.
pub fn parse_feed_items(
    bytes: &[u8],
    source_label: Option<&str>,
) -> Result<Vec<NormalizedItem>, FetchError> {
    let feed = parser::Builder::new()
        .timestamp_parser(parse_feed_timestamp)
        .build()
        .parse(bytes)
        .map_err(|e| FetchError::Parse(e.to_string()))?;

    let source = feed_source_label(&feed, source_label);

    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| normalize_entry(entry, &source))
        .collect())
}

/// Pick the source label: explicit override, then feed title, then "RSS".
fn feed_source_label(feed: &Feed, source_label: Option<&str>) -> String {
    if let Some(label) = source_label.map(str::trim).filter(|l| !l.is_empty()) {
        return label.to_string();
    }
    feed.title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_FEED_SOURCE.to_string())
}

/// Convert one entry, or `None` if it has no title or no link.
fn normalize_entry(entry: Entry, source: &str) -> Option<NormalizedItem> {
    let title = entry
        .title
        .as_ref()
        .map(|t| strip_html(&RawText::from(t.content.as_str()).coerce()))
        .unwrap_or_default();
    if title.is_empty() {
        debug!(id = %entry.id, "Dropping feed entry without title");
        return None;
    }

    let Some(url) = entry_link(&entry) else {
        debug!(title = %title, "Dropping feed entry without link");
        return None;
    };

    let summary_raw = entry
        .summary
        .as_ref()
        .map(|s| RawText::from(s.content.as_str()));
    let content_raw = entry
        .content
        .as_ref()
        .and_then(|c| c.body.as_deref())
        .map(RawText::from);
    let summary = coerce_first(&[summary_raw.as_ref(), content_raw.as_ref()]);
    let summary = truncate_chars(&strip_html(&summary), MAX_SUMMARY_LENGTH);

    let published_at = entry
        .published
        .or(entry.updated)
        .unwrap_or_else(|| parse_feed_date_or_now(None));

    Some(NormalizedItem {
        title,
        summary,
        source: source.to_string(),
        url,
        published_at,
    })
}

/// The entry's link, falling back to its identifier when that is a URL.
fn entry_link(entry: &Entry) -> Option<String> {
    if let Some(link) = preferred_link(&entry.links) {
        return Some(link);
    }

    // feed-rs synthesizes an id when the document has none, so only an id that
    // is itself an http(s) URL can stand in for the link.
    let id = entry.id.trim();
    parse_http_url(id).ok().map(|_| id.to_string())
}

/// Prefer the `alternate` link, then any link with a non-empty href.
fn preferred_link(links: &[Link]) -> Option<String> {
    let non_empty = || links.iter().filter(|l| !l.href.trim().is_empty());
    non_empty()
        .find(|l| {
            l.rel.as_deref().map_or(true, |rel| {
                rel.is_empty() || rel.eq_ignore_ascii_case("alternate")
            })
        })
        .or_else(|| non_empty().next())
        .map(|l| l.href.trim().to_string())
}

/// Strip HTML tags from text and decode common entities.
fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut in_entity = false;
    let mut entity = String::new();

    for ch in html.chars() {
        match ch {
            '<' if !in_entity => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                result.push(' ');
            }
            '&' if !in_tag => {
                if in_entity {
                    result.push('&');
                    result.push_str(&entity);
                }
                in_entity = true;
                entity.clear();
            }
            ';' if in_entity => {
                in_entity = false;
                decode_entity(&entity, &mut result);
            }
            _ if in_entity => {
                if ch.is_whitespace() || entity.len() > 10 {
                    // Not an entity after all
                    in_entity = false;
                    result.push('&');
                    result.push_str(&entity);
                    result.push(ch);
                } else {
                    entity.push(ch);
                }
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    if in_entity {
        result.push('&');
        result.push_str(&entity);
    }

    result.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn decode_entity(entity: &str, out: &mut String) {
    match entity {
        "amp" => out.push('&'),
        "lt" => out.push('<'),
        "gt" => out.push('>'),
        "quot" => out.push('"'),
        "apos" => out.push('\''),
        "nbsp" => out.push(' '),
        _ => match parse_numeric_entity(entity).and_then(char::from_u32) {
            Some(c) => out.push(c),
            None => {
                out.push('&');
                out.push_str(entity);
                out.push(';');
            }
        },
    }
}

/// Parse a numeric HTML entity (e.g., "#123" or "#x7B").
fn parse_numeric_entity(entity: &str) -> Option<u32> {
    let digits = entity.strip_prefix('#')?;
    match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => digits.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn assert_recent(dt: chrono::DateTime<Utc>) {
        assert!((Utc::now() - dt).num_seconds().abs() <= 5);
    }

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>  World Desk  </title>
    <link>https://example.com</link>
    <description>A test feed</description>
    <item>
      <title>First Article</title>
      <link>https://example.com/1</link>
      <guid>guid-1</guid>
      <description>&lt;p&gt;Hello &amp;amp; welcome&lt;/p&gt;</description>
      <pubDate>Mon, 02 Jan 2006 15:04:05 GMT</pubDate>
    </item>
    <item>
      <title>   </title>
      <link>https://example.com/blank-title</link>
    </item>
    <item>
      <title>No link, opaque guid</title>
      <guid isPermaLink="false">tag-123</guid>
    </item>
    <item>
      <title>Guid permalink</title>
      <guid>https://example.com/from-guid</guid>
      <pubDate>not a date</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss_entries() {
        let items = parse_feed_items(RSS.as_bytes(), None).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.title, "First Article");
        assert_eq!(first.url, "https://example.com/1");
        assert_eq!(first.source, "World Desk");
        assert_eq!(first.summary, "Hello & welcome");
        assert_eq!(
            first.published_at,
            Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap()
        );

        let second = &items[1];
        assert_eq!(second.title, "Guid permalink");
        assert_eq!(second.url, "https://example.com/from-guid");
        assert_eq!(second.summary, "");
        assert_recent(second.published_at);
    }

    #[test]
    fn test_blank_title_is_dropped() {
        let items = parse_feed_items(RSS.as_bytes(), None).unwrap();
        assert!(items
            .iter()
            .all(|i| i.url != "https://example.com/blank-title"));
    }

    #[test]
    fn test_missing_link_is_dropped() {
        let items = parse_feed_items(RSS.as_bytes(), None).unwrap();
        assert!(items.iter().all(|i| i.title != "No link, opaque guid"));
    }

    #[test]
    fn test_source_label_override() {
        let items = parse_feed_items(RSS.as_bytes(), Some("Wire")).unwrap();
        assert!(items.iter().all(|i| i.source == "Wire"));
    }

    #[test]
    fn test_source_defaults_to_rss() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <item>
      <title>Untitled channel item</title>
      <link>https://example.com/x</link>
    </item>
  </channel>
</rss>"#;
        let items = parse_feed_items(rss.as_bytes(), None).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, "RSS");
    }

    #[test]
    fn test_parse_atom_entries() {
        let atom = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <link href="https://example.com"/>
  <entry>
    <id>urn:uuid:1</id>
    <title>Atom Entry</title>
    <link rel="enclosure" href="https://example.com/audio.mp3"/>
    <link rel="alternate" href="https://example.com/entry"/>
    <content type="html">&lt;b&gt;Body&lt;/b&gt; text</content>
    <updated>2025-01-01T00:00:00Z</updated>
  </entry>
</feed>"#;

        let items = parse_feed_items(atom.as_bytes(), None).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Atom Entry");
        assert_eq!(items[0].url, "https://example.com/entry");
        assert_eq!(items[0].source, "Atom Feed");
        assert_eq!(items[0].summary, "Body text");
        assert_eq!(
            items[0].published_at,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_html_title_is_decoded() {
        let atom = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <entry>
    <id>urn:uuid:2</id>
    <title type="html">Rates &amp;amp; &lt;b&gt;bonds&lt;/b&gt;</title>
    <link href="https://example.com/rates"/>
  </entry>
</feed>"#;

        let items = parse_feed_items(atom.as_bytes(), None).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Rates & bonds");
    }

    #[test]
    fn test_title_of_only_markup_is_dropped() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
<item><title>&lt;br/&gt;</title><link>https://example.com/empty</link></item>
</channel></rss>"#;
        let items = parse_feed_items(rss.as_bytes(), None).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_lenient_feed_dates() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
<item><title>A</title><link>https://example.com/a</link><pubDate>Mon, 02 Jan 2006 15:04:05 UTC</pubDate></item>
<item><title>B</title><link>https://example.com/b</link><pubDate>Mon, 02 Jan 2006 5:04:05 GMT</pubDate></item>
<item><title>C</title><link>https://example.com/c</link><pubDate>Mon, 02 Jan 2006 15:04:05 IST</pubDate></item>
<item><title>D</title><link>https://example.com/d</link><pubDate>2006-01-02T15:04:05+0000</pubDate></item>
</channel></rss>"#;
        let items = parse_feed_items(rss.as_bytes(), None).unwrap();
        let dates: Vec<_> = items.iter().map(|i| i.published_at).collect();
        assert_eq!(
            dates,
            vec![
                Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap(),
                Utc.with_ymd_and_hms(2006, 1, 2, 5, 4, 5).unwrap(),
                Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap(),
                Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap(),
            ]
        );
    }

    #[test]
    fn test_parse_invalid_document() {
        let err = parse_feed_items(b"This is not XML", None).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_summary_is_truncated() {
        let long = "a".repeat(MAX_SUMMARY_LENGTH + 100);
        let rss = format!(
            r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
<item><title>Long</title><link>https://example.com/long</link><description>{long}</description></item>
</channel></rss>"#
        );
        let items = parse_feed_items(rss.as_bytes(), None).unwrap();
        assert_eq!(items[0].summary.chars().count(), MAX_SUMMARY_LENGTH);
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Hello</p>"), "Hello");
        assert_eq!(strip_html("<b>Bold</b>text"), "Bold text");
        assert_eq!(strip_html("&lt;tag&gt;"), "<tag>");
        assert_eq!(strip_html("A&nbsp;B"), "A B");
        assert_eq!(strip_html("&#65;&#x42;"), "AB");
        assert_eq!(strip_html("Fish & chips"), "Fish & chips");
        assert_eq!(strip_html("&unknown;"), "&unknown;");
        assert_eq!(
            strip_html("<p>\n\tNewlines\n\tand\ttabs\n</p>"),
            "Newlines and tabs"
        );
    }

    #[test]
    fn test_parse_numeric_entity() {
        assert_eq!(parse_numeric_entity("#65"), Some(65));
        assert_eq!(parse_numeric_entity("#x41"), Some(65));
        assert_eq!(parse_numeric_entity("#X41"), Some(65));
        assert_eq!(parse_numeric_entity("invalid"), None);
    }

    #[tokio::test]
    async fn test_fetch_one_rejects_private_host() {
        let fetcher = FeedFetcher::new(vec![]).unwrap();
        let err = fetcher
            .fetch_one("http://127.0.0.1/feed.xml")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[test]
    fn test_with_source_label() {
        let fetcher = FeedFetcher::new(vec![]).unwrap().with_source_label("Desk");
        assert_eq!(fetcher.source_label.as_deref(), Some("Desk"));
    }

    #[tokio::test]
    async fn test_fetch_skips_invalid_feeds() {
        let fetcher = FeedFetcher::new(vec![
            "ftp://example.com/feed.xml".to_string(),
            "http://localhost/feed.xml".to_string(),
        ])
        .unwrap();
        let items = fetcher.fetch().await.unwrap();
        assert!(items.is_empty());
    }
}
