//! Test helpers for integration tests.
//!
//! Provides a local upstream server standing in for feeds and the headline
//! API, plus helpers to build configurations pointing at it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::Query;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use newsdesk::config::NewsConfig;

/// API key the fake headline API accepts.
pub const TEST_API_KEY: &str = "test-key";

/// How long the slow upstream routes stall before answering.
pub const SLOW_RESPONSE: Duration = Duration::from_secs(10);

/// A feed with two valid items and one without a title.
pub const GOOD_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Local Wire</title>
    <link>http://example.com</link>
    <description>Test feed</description>
    <item>
      <title>Rates held steady</title>
      <link>https://news.example.com/rates</link>
      <description>The central bank kept rates unchanged.</description>
      <pubDate>Tue, 05 Mar 2024 09:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Monsoon forecast issued</title>
      <link>https://news.example.com/monsoon</link>
      <pubDate>Wed, 06 Mar 2024 09:00:00 GMT</pubDate>
    </item>
    <item>
      <title></title>
      <link>https://news.example.com/untitled</link>
    </item>
  </channel>
</rss>"#;

/// A second feed sharing one story with [`GOOD_FEED`].
pub const OVERLAPPING_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Other Wire</title>
    <item>
      <title>Rates held steady</title>
      <link>https://news.example.com/rates</link>
    </item>
    <item>
      <title>Cricket final tonight</title>
      <link>https://news.example.com/cricket</link>
      <pubDate>Thu, 07 Mar 2024 09:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

/// Headline API payload with one valid and one unusable article.
pub const HEADLINES: &str = r#"{
  "status": "ok",
  "totalResults": 2,
  "articles": [
    {
      "source": {"id": null, "name": "Daily Ledger"},
      "title": "Budget session opens",
      "url": "https://ledger.example.com/budget",
      "description": "Parliament convenes.",
      "publishedAt": "2024-03-08T04:30:00Z"
    },
    {
      "source": {"id": null, "name": "Daily Ledger"},
      "title": null,
      "url": "https://ledger.example.com/untitled"
    }
  ]
}"#;

async fn good_feed() -> Response {
    rss(GOOD_FEED)
}

async fn overlapping_feed() -> Response {
    rss(OVERLAPPING_FEED)
}

async fn not_a_feed() -> Response {
    ([(header::CONTENT_TYPE, "text/html")], "<html><body>nope</body></html>").into_response()
}

async fn huge_feed() -> Response {
    rss(&format!("{}<!-- {} -->", GOOD_FEED, "x".repeat(64 * 1024)))
}

fn rss(body: &str) -> Response {
    (
        [(header::CONTENT_TYPE, "application/rss+xml")],
        body.to_string(),
    )
        .into_response()
}

async fn headlines(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    let key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    if key != Some(TEST_API_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            r#"{"status":"error","message":"bad key"}"#,
        )
            .into_response();
    }
    if params.get("pageSize").map(String::as_str) != Some("50") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    if params.get("q").map(String::as_str) == Some("empty") {
        return ([(header::CONTENT_TYPE, "application/json")], r#"{"articles": []}"#)
            .into_response();
    }
    ([(header::CONTENT_TYPE, "application/json")], HEADLINES).into_response()
}

async fn broken_api() -> Response {
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

async fn slow_feed() -> Response {
    tokio::time::sleep(SLOW_RESPONSE).await;
    rss(GOOD_FEED)
}

async fn slow_api() -> Response {
    tokio::time::sleep(SLOW_RESPONSE).await;
    ([(header::CONTENT_TYPE, "application/json")], HEADLINES).into_response()
}

/// Start the fake upstream and return its address.
pub async fn spawn_upstream() -> SocketAddr {
    let router = Router::new()
        .route("/feeds/good.xml", get(good_feed))
        .route("/feeds/overlap.xml", get(overlapping_feed))
        .route("/feeds/html", get(not_a_feed))
        .route("/feeds/huge.xml", get(huge_feed))
        .route("/feeds/slow.xml", get(slow_feed))
        .route("/v2/top-headlines", get(headlines))
        .route("/v2/broken", get(broken_api))
        .route("/v2/slow", get(slow_api));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A news configuration reading the given upstream paths.
pub fn news_config(addr: SocketAddr, feed_paths: &[&str]) -> NewsConfig {
    NewsConfig {
        feeds: feed_paths
            .iter()
            .map(|path| format!("http://{addr}{path}"))
            .collect(),
        newsapi_endpoint: format!("http://{addr}/v2/top-headlines"),
        allow_private_hosts: true,
        feed_timeout_secs: 5,
        api_timeout_secs: 5,
        connect_timeout_secs: 2,
        ..NewsConfig::default()
    }
}
