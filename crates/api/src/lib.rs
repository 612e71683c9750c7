//! HTTP API layer for storehook.
//!
//! This crate provides the management REST API:
//!
//! - **Endpoints**: subscriber management
//! - **Extractors**: admin capability
//! - **Middleware**: admin token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
