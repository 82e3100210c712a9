//! Headline API source.
//!
//! Queries a NewsAPI-compatible `top-headlines` endpoint. Unlike feeds, the
//! API is one request: a transport failure or non-success status fails the
//! whole source with a [`FetchError`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::fetcher::{read_body_limited, FetchError, HttpSettings, SourceFetcher};
use super::raw::{coerce, coerce_first, RawText};
use super::types::{NormalizedItem, DEFAULT_API_SOURCE};
use crate::config::NewsConfig;
use crate::datetime::parse_api_date_or_now;

/// Number of articles requested per call.
pub const PAGE_SIZE: u32 = 50;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "X-Api-Key";

/// Fetches headlines for a query from the headline API.
pub struct HeadlineApiFetcher {
    client: Client,
    api_key: String,
    query: String,
    language: String,
    endpoint: String,
    max_response_size: u64,
}

impl HeadlineApiFetcher {
    /// Create a fetcher against the default endpoint.
    pub fn new(
        api_key: impl Into<String>,
        query: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let defaults = NewsConfig::default();
        Ok(Self {
            client: HttpSettings::for_api(&defaults).build_client()?,
            api_key: api_key.into(),
            query: query.into(),
            language: language.into(),
            endpoint: defaults.newsapi_endpoint,
            max_response_size: defaults.max_feed_size_bytes,
        })
    }

    /// Create a fetcher from configuration, or `None` when no key is set.
    pub fn from_config(config: &NewsConfig) -> Result<Option<Self>, FetchError> {
        let Some(api_key) = config.api_key() else {
            return Ok(None);
        };

        Ok(Some(Self {
            client: HttpSettings::for_api(config).build_client()?,
            api_key: api_key.to_string(),
            query: config.newsapi_query.clone(),
            language: config.newsapi_language.clone(),
            endpoint: config.newsapi_endpoint.clone(),
            max_response_size: config.max_feed_size_bytes,
        }))
    }

    /// Point the fetcher at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self) -> Result<url::Url, FetchError> {
        let page_size = PAGE_SIZE.to_string();
        url::Url::parse_with_params(
            &self.endpoint,
            [
                ("q", self.query.as_str()),
                ("language", self.language.as_str()),
                ("pageSize", page_size.as_str()),
            ],
        )
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", self.endpoint)))
    }
}

#[async_trait]
impl SourceFetcher for HeadlineApiFetcher {
    fn name(&self) -> &str {
        "headline-api"
    }

    async fn fetch(&self) -> Result<Vec<NormalizedItem>, FetchError> {
        let url = self.request_url()?;
        debug!(endpoint = %self.endpoint, query = %self.query, "Requesting headlines");

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = read_body_limited(response, self.max_response_size).await?;
        let items = parse_headlines(&body)?;

        info!(items = items.len(), "Headline fetch complete");
        Ok(items)
    }
}

#[derive(Debug, Deserialize)]
struct HeadlineResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    #[serde(default)]
    title: Option<RawText>,
    #[serde(default)]
    url: Option<RawText>,
    #[serde(default)]
    description: Option<RawText>,
    #[serde(default)]
    content: Option<RawText>,
    #[serde(default)]
    published_at: Option<RawText>,
    #[serde(default)]
    source: Option<serde_json::Value>,
}

/// Decode a headline API response body into normalized items.
///
/// Articles without a title or url are dropped, as are entries that are not
/// JSON objects.
pub fn parse_headlines(body: &[u8]) -> Result<Vec<NormalizedItem>, FetchError> {
    let response: HeadlineResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if response.status.as_deref() == Some("error") {
        return Err(FetchError::Decode(format!(
            "API reported error: {}",
            response.message.unwrap_or_default()
        )));
    }

    Ok(response
        .articles
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<ApiArticle>(value) {
            Ok(article) => normalize_article(article),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable article");
                None
            }
        })
        .collect())
}

fn normalize_article(article: ApiArticle) -> Option<NormalizedItem> {
    let title = coerce(article.title.as_ref());
    let url = coerce(article.url.as_ref());
    if title.is_empty() || url.is_empty() {
        return None;
    }

    let summary = coerce_first(&[article.description.as_ref(), article.content.as_ref()]);
    let source = source_name(article.source.as_ref());
    let published = coerce(article.published_at.as_ref());
    let published_at = parse_api_date_or_now(Some(published.as_str()));

    Some(NormalizedItem {
        title,
        summary,
        source,
        url,
        published_at,
    })
}

/// The nested `source.name`, or the provider default.
fn source_name(source: Option<&serde_json::Value>) -> String {
    source
        .and_then(|s| s.get("name"))
        .and_then(|name| serde_json::from_value::<RawText>(name.clone()).ok())
        .map(|name| name.coerce())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_API_SOURCE.to_string())
}
