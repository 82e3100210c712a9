//! Web API for newsdesk.
//!
//! Exposes the fetch trigger and the article listing over HTTP.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::{ApiError, ErrorCode};
pub use handlers::{AppState, SharedDatabase};
pub use router::{create_health_router, create_router};
pub use server::WebServer;
