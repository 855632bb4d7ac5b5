//! Core business logic for sociograph.
//!
//! The relationship state machine (follow, follow requests, block,
//! close friends) and the visibility gate, built on the `sociograph-db`
//! edge store.

pub mod services;

pub use services::*;

use sociograph_db::repositories::{EdgeStore, UserRepository};
use std::sync::Arc;

/// All graph services, wired to one shared connection.
#[derive(Clone)]
pub struct GraphServices {
    /// Follow and follow-request lifecycle.
    pub following: FollowingService,
    /// Block and unblock with cascading cleanup.
    pub blocking: BlockingService,
    /// Close-friend lists.
    pub close_friends: CloseFriendService,
    /// Visibility gate and relationship summaries.
    pub visibility: VisibilityService,
}

impl GraphServices {
    /// Build every service on top of `db`.
    #[must_use]
    pub fn new(db: Arc<sea_orm::DatabaseConnection>) -> Self {
        let edges = EdgeStore::new(db.clone());
        let visibility = VisibilityService::new(edges.clone(), UserRepository::new(db));

        Self {
            following: FollowingService::new(edges.clone(), visibility.clone()),
            blocking: BlockingService::new(edges.clone()),
            close_friends: CloseFriendService::new(edges),
            visibility,
        }
    }
}
