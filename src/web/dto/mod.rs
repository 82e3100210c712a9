//! Data Transfer Objects for the web API.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
