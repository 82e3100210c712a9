//! API handlers for the web API.

pub mod news;

pub use news::*;

use std::sync::Arc;

use crate::config::NewsConfig;
use crate::Database;

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

/// Application state shared by all handlers.
pub struct AppState {
    /// Database (the sqlx pool is internally synchronized).
    pub db: SharedDatabase,
    /// Source configuration used by fetch cycles.
    pub news: NewsConfig,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: SharedDatabase, news: NewsConfig) -> Self {
        Self { db, news }
    }
}
