//! Source fetcher abstraction and shared HTTP plumbing.
//!
//! Every news source implements [`SourceFetcher`]. Network access goes through
//! a [`reqwest::Client`] built from [`HttpSettings`], so each request has a
//! connect timeout, a total timeout and a redirect limit.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use thiserror::Error;

use super::types::NormalizedItem;
use crate::config::NewsConfig;

/// User agent string sent with every request.
pub const USER_AGENT: &str = concat!("newsdesk/", env!("CARGO_PKG_VERSION"));

/// Errors raised while fetching a source.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL was rejected before any request was made.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The request did not complete within its time budget.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The request failed (connect, TLS, body read).
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The response body exceeded the size limit.
    #[error("response too large: {size} bytes (max {max} bytes)")]
    TooLarge {
        /// Observed size.
        size: u64,
        /// Allowed size.
        max: u64,
    },

    /// A feed document could not be parsed.
    #[error("failed to parse feed: {0}")]
    Parse(String),

    /// A JSON payload could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else if e.is_builder() {
            FetchError::Client(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// A news source.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetch and normalize the source's current articles.
    ///
    /// Malformed individual entries are dropped, never reported.
    async fn fetch(&self) -> Result<Vec<NormalizedItem>, FetchError>;
}

/// HTTP limits applied to one kind of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Total request timeout.
    pub total_timeout: Duration,
    /// Maximum redirects to follow.
    pub max_redirects: usize,
}

impl HttpSettings {
    /// Limits for feed requests.
    pub fn for_feeds(config: &NewsConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            total_timeout: Duration::from_secs(config.feed_timeout_secs),
            max_redirects: config.max_redirects,
        }
    }

    /// Limits for headline API requests.
    pub fn for_api(config: &NewsConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            total_timeout: Duration::from_secs(config.api_timeout_secs),
            max_redirects: config.max_redirects,
        }
    }

    /// Build a client enforcing these limits.
    pub fn build_client(&self) -> Result<Client, FetchError> {
        Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.total_timeout)
            .redirect(reqwest::redirect::Policy::limited(self.max_redirects))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self::for_api(&NewsConfig::default())
    }
}

/// Read a response body, rejecting it if it exceeds `max_size` bytes.
pub async fn read_body_limited(response: Response, max_size: u64) -> Result<Vec<u8>, FetchError> {
    if let Some(content_length) = response.content_length() {
        if content_length > max_size {
            return Err(FetchError::TooLarge {
                size: content_length,
                max: max_size,
            });
        }
    }

    let bytes = response.bytes().await?;
    if bytes.len() as u64 > max_size {
        return Err(FetchError::TooLarge {
            size: bytes.len() as u64,
            max: max_size,
        });
    }

    Ok(bytes.to_vec())
}

/// Validate a URL for SSRF protection.
///
/// This function checks that:
/// - The URL uses http or https scheme
/// - The host is not a private/loopback address
/// - The host is not a reserved hostname
pub fn validate_url(url: &str) -> Result<(), FetchError> {
    let parsed = parse_http_url(url)?;

    let host = parsed
        .host()
        .ok_or_else(|| FetchError::InvalidUrl(format!("URL has no host: {url}")))?;

    match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(FetchError::InvalidUrl(format!("forbidden host: {domain}")));
            }
        }
        url::Host::Ipv4(ipv4) => check_ip(IpAddr::V4(ipv4))?,
        url::Host::Ipv6(ipv6) => check_ip(IpAddr::V6(ipv6))?,
    }

    Ok(())
}

/// Parse a URL and require an http or https scheme.
pub fn parse_http_url(url: &str) -> Result<url::Url, FetchError> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(FetchError::InvalidUrl(format!(
            "unsupported URL scheme: {scheme}"
        ))),
    }
}

fn check_ip(ip: IpAddr) -> Result<(), FetchError> {
    if is_private_ip(&ip) {
        return Err(FetchError::InvalidUrl(format!(
            "private IP address not allowed: {ip}"
        )));
    }
    Ok(())
}

/// Check if a hostname is forbidden.
fn is_forbidden_hostname(host: &str) -> bool {
    let host_lower = host.to_lowercase();

    if host_lower == "localhost" {
        return true;
    }

    const FORBIDDEN_SUFFIXES: [&str; 7] = [
        ".local",
        ".localhost",
        ".internal",
        ".intranet",
        ".corp",
        ".home",
        ".lan",
    ];

    FORBIDDEN_SUFFIXES
        .iter()
        .any(|suffix| host_lower.ends_with(suffix))
}

/// Check if an IP address is private/reserved.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                || ipv4.is_documentation()
                // Carrier-grade NAT: 100.64.0.0/10
                || (octets[0] == 100 && (64..=127).contains(&octets[1]))
        }
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped));
            }
            let segments = ipv6.segments();
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // Unique local: fc00::/7
                || (segments[0] & 0xfe00) == 0xfc00
                // Link-local: fe80::/10
                || (segments[0] & 0xffc0) == 0xfe80
        }
    }
}
