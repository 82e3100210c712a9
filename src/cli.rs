//! Command-line interface definitions for newsdesk.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::datetime::format_utc_datetime;
use crate::news::{FetchReport, StoredArticle};

/// Display format for article timestamps.
const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Longest title shown on one output line, in characters.
const DISPLAY_TITLE_WIDTH: usize = 80;

/// Command-line arguments.
///
/// ```sh
/// # Fetch once and print the newest articles
/// newsdesk fetch
///
/// # Serve the HTTP API with a custom config
/// newsdesk --config /etc/newsdesk.toml serve
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// What to do (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run one fetch cycle and print the latest articles
    Fetch,
    /// Serve the HTTP API
    Serve,
}

impl Cli {
    /// The requested command, `serve` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

/// Summary line printed after a fetch.
pub fn fetch_summary(report: &FetchReport) -> String {
    format!(
        "Fetched {}, created {} new articles.",
        report.fetched, report.created
    )
}

/// One line describing an article, with its time shown in `timezone`.
pub fn article_line(article: &StoredArticle, timezone: &str) -> String {
    let when = format_utc_datetime(&article.published_at, timezone, DISPLAY_TIME_FORMAT);
    let mut title: String = article.title.chars().take(DISPLAY_TITLE_WIDTH).collect();
    if article.title.chars().count() > DISPLAY_TITLE_WIDTH {
        title.push_str("...");
    }
    format!("{when}  {} | {title}", article.source)
}
