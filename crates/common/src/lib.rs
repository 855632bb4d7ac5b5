//! Common utilities and shared types for sociograph.
//!
//! This crate provides foundational components used across all sociograph crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Pagination**: The cursor contract shared by every relationship listing,
//!   via [`PageRequest`] and [`Page`]
//!
//! # Example
//!
//! ```no_run
//! use sociograph_common::{AppResult, Config, PageRequest};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let page = PageRequest::new(None, Some(50));
//!     println!("listening on {}:{}, page size {}", config.server.host, config.server.port, page.limit);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pagination;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use pagination::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, Page, PageRequest};
