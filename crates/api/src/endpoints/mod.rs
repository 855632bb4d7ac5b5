//! API endpoints.

#![allow(missing_docs)]

mod blocking;
mod close_friends;
mod following;
mod users;

use axum::Router;
use serde::Deserialize;
use sociograph_common::{AppError, AppResult, PageRequest};
use validator::Validate;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/following", following::router())
        .nest("/blocking", blocking::router())
        .nest("/close-friends", close_friends::router())
        .nest("/users", users::router())
}

/// Body naming a single other user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserIdRequest {
    #[validate(range(min = 1))]
    pub user_id: i64,
}

/// Body of every listing endpoint.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ListRequest {
    /// Whose list; defaults to the caller.
    #[validate(range(min = 1))]
    pub user_id: Option<i64>,
    /// Id of the last item already seen.
    #[validate(range(min = 1))]
    pub cursor: Option<i64>,
    /// Clamped into `1..=100`.
    pub limit: Option<u64>,
}

impl ListRequest {
    fn page(&self) -> PageRequest {
        PageRequest::new(self.cursor, self.limit)
    }

    /// Validate a listing of the caller's own edges.
    ///
    /// A `userId` naming anyone else is refused rather than ignored.
    fn own_page(&self, caller_id: i64) -> AppResult<PageRequest> {
        self.validate()?;

        match self.user_id {
            Some(id) if id != caller_id => Err(AppError::PermissionDenied(
                "this list is only available for your own account".to_string(),
            )),
            _ => Ok(self.page()),
        }
    }
}
