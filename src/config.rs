//! Configuration module for newsdesk.

use serde::Deserialize;
use std::path::Path;

use crate::{NewsdeskError, Result};

/// Environment variable that overrides `news.newsapi_key`.
pub const NEWSAPI_KEY_ENV: &str = "NEWSAPI_KEY";

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Timezone for displaying dates (e.g., "Asia/Tokyo", "UTC").
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timezone: default_timezone(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/newsdesk.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/newsdesk.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// News source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    /// Feed URLs, fetched in this order.
    #[serde(default)]
    pub feeds: Vec<String>,
    /// Source label applied to every feed item instead of the feed title.
    #[serde(default)]
    pub source_label: Option<String>,
    /// Headline API key. The API source is skipped when unset.
    #[serde(default)]
    pub newsapi_key: Option<String>,
    /// Search term sent to the headline API.
    #[serde(default = "default_newsapi_query")]
    pub newsapi_query: String,
    /// Language sent to the headline API.
    #[serde(default = "default_newsapi_language")]
    pub newsapi_language: String,
    /// Headline API endpoint.
    #[serde(default = "default_newsapi_endpoint")]
    pub newsapi_endpoint: String,
    /// Total request timeout for the headline API in seconds.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,
    /// Total request timeout per feed in seconds.
    #[serde(default = "default_feed_timeout")]
    pub feed_timeout_secs: u64,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Number of feeds fetched at the same time.
    #[serde(default = "default_max_concurrent_feeds")]
    pub max_concurrent_feeds: usize,
    /// Allow feed URLs that resolve to loopback or private hosts.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

fn default_newsapi_query() -> String {
    "India".to_string()
}

fn default_newsapi_language() -> String {
    "en".to_string()
}

fn default_newsapi_endpoint() -> String {
    "https://newsapi.org/v2/top-headlines".to_string()
}

fn default_api_timeout() -> u64 {
    20
}

fn default_feed_timeout() -> u64 {
    20
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_concurrent_feeds() -> usize {
    4
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            feeds: vec![],
            source_label: None,
            newsapi_key: None,
            newsapi_query: default_newsapi_query(),
            newsapi_language: default_newsapi_language(),
            newsapi_endpoint: default_newsapi_endpoint(),
            api_timeout_secs: default_api_timeout(),
            feed_timeout_secs: default_feed_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_feed_size_bytes: default_max_feed_size(),
            max_redirects: default_max_redirects(),
            max_concurrent_feeds: default_max_concurrent_feeds(),
            allow_private_hosts: false,
        }
    }
}

impl NewsConfig {
    /// The API key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.newsapi_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// News source configuration.
    #[serde(default)]
    pub news: NewsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(NewsdeskError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| NewsdeskError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `NEWSAPI_KEY`: Override the headline API key
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(NEWSAPI_KEY_ENV) {
            self.apply_api_key_override(&key);
        }
    }

    fn apply_api_key_override(&mut self, key: &str) {
        if !key.trim().is_empty() {
            self.news.newsapi_key = Some(key.trim().to_string());
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - A timeout is zero
    /// - No feeds are configured and no API key is set
    pub fn validate(&self) -> Result<()> {
        if self.news.api_timeout_secs == 0
            || self.news.feed_timeout_secs == 0
            || self.news.connect_timeout_secs == 0
        {
            return Err(NewsdeskError::Config(
                "news timeouts must be greater than zero".to_string(),
            ));
        }
        if self.news.max_concurrent_feeds == 0 {
            return Err(NewsdeskError::Config(
                "news.max_concurrent_feeds must be at least 1".to_string(),
            ));
        }
        if self.news.feeds.is_empty() && self.news.api_key().is_none() {
            return Err(NewsdeskError::Config(
                "no news sources configured: set news.feeds or news.newsapi_key".to_string(),
            ));
        }
        Ok(())
    }
}
