//! HTTP API layer for sociograph.
//!
//! JSON `POST` endpoints over the relationship services:
//!
//! - **Endpoints**: following, follow requests, blocking, close friends, relations
//! - **Extractors**: bearer-token authentication
//! - **Middleware**: token resolution and the shared application state
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
