//! Visibility gate.
//!
//! Decides whether a viewer may see another user's relationship lists and
//! non-authored content. Two policies sit on top of the same decision:
//! listings turn a hidden target into an empty page or a hard
//! `PermissionDenied`, while [`VisibilityService::relationship`] only reports
//! `can_view` so profile pages can degrade gracefully.

use serde::Serialize;
use sociograph_common::{AppError, AppResult};
use sociograph_db::{
    entities::{Block, CloseFriend, Follow, user},
    repositories::{EdgeStore, FollowRequestRepository, UserRepository},
};

/// Why a target is or is not visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VisibilityReason {
    /// Viewer and target are the same user.
    SelfView,
    /// Public target, no block against the viewer.
    Public,
    /// Private target followed by the viewer.
    ApprovedFollower,
    /// The target blocks the viewer.
    BlockedByTarget,
    /// Private target the viewer does not follow.
    PrivateNotFollowed,
}

/// Outcome of a visibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    /// Whether the viewer may see the target's lists.
    pub visible: bool,
    /// Why.
    pub reason: VisibilityReason,
}

impl Visibility {
    const fn of(reason: VisibilityReason) -> Self {
        Self {
            visible: matches!(
                reason,
                VisibilityReason::SelfView
                    | VisibilityReason::Public
                    | VisibilityReason::ApprovedFollower
            ),
            reason,
        }
    }
}

/// How a listing should answer a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingAccess {
    /// Serve the page.
    Allowed,
    /// Answer with an empty page without revealing the block.
    Hidden,
}

/// Relationship between a viewer and a target, as seen by the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Target id.
    pub id: i64,
    pub is_following: bool,
    pub is_followed_by: bool,
    /// Viewer has a pending request to the target.
    pub has_pending_request: bool,
    /// Target has a pending request to the viewer.
    pub has_incoming_request: bool,
    pub is_blocking: bool,
    pub is_blocked_by: bool,
    /// Target is on the viewer's close-friend list.
    pub is_close_friend: bool,
    pub is_private: bool,
    pub can_view: bool,
}

/// Visibility service.
#[derive(Clone)]
pub struct VisibilityService {
    edges: EdgeStore,
    user_repo: UserRepository,
}

impl VisibilityService {
    /// Create a new visibility service.
    #[must_use]
    pub const fn new(edges: EdgeStore, user_repo: UserRepository) -> Self {
        Self { edges, user_repo }
    }

    /// Decide whether `viewer_id` may see `target_id`'s lists.
    pub async fn can_view(&self, viewer_id: i64, target_id: i64) -> AppResult<Visibility> {
        let target = self.user_repo.get_by_id(target_id).await?;
        self.evaluate(viewer_id, &target).await
    }

    async fn evaluate(&self, viewer_id: i64, target: &user::Model) -> AppResult<Visibility> {
        if viewer_id == target.id {
            return Ok(Visibility::of(VisibilityReason::SelfView));
        }

        let conn = self.edges.connection();
        if EdgeStore::exists::<Block>(conn, target.id, viewer_id).await? {
            return Ok(Visibility::of(VisibilityReason::BlockedByTarget));
        }
        if !target.is_private {
            return Ok(Visibility::of(VisibilityReason::Public));
        }

        let reason = if EdgeStore::exists::<Follow>(conn, viewer_id, target.id).await? {
            VisibilityReason::ApprovedFollower
        } else {
            VisibilityReason::PrivateNotFollowed
        };
        Ok(Visibility::of(reason))
    }

    /// Gate for the followers/following listings.
    ///
    /// A block by the target hides the list; a private target the viewer does
    /// not follow is refused outright.
    pub async fn check_listing(&self, viewer_id: i64, target_id: i64) -> AppResult<ListingAccess> {
        let visibility = self.can_view(viewer_id, target_id).await?;
        match visibility.reason {
            VisibilityReason::BlockedByTarget => Ok(ListingAccess::Hidden),
            VisibilityReason::PrivateNotFollowed => Err(AppError::PermissionDenied(
                "this account is private".to_string(),
            )),
            _ => Ok(ListingAccess::Allowed),
        }
    }

    /// Summarize the relationship between `viewer_id` and `target_id`.
    pub async fn relationship(&self, viewer_id: i64, target_id: i64) -> AppResult<Relationship> {
        let target = self.user_repo.get_by_id(target_id).await?;
        let visibility = self.evaluate(viewer_id, &target).await?;
        let conn = self.edges.connection();

        let has_pending_request = FollowRequestRepository::find_pending(conn, viewer_id, target_id)
            .await?
            .is_some();
        let has_incoming_request = FollowRequestRepository::find_pending(conn, target_id, viewer_id)
            .await?
            .is_some();

        Ok(Relationship {
            id: target_id,
            is_following: EdgeStore::exists::<Follow>(conn, viewer_id, target_id).await?,
            is_followed_by: EdgeStore::exists::<Follow>(conn, target_id, viewer_id).await?,
            has_pending_request,
            has_incoming_request,
            is_blocking: EdgeStore::exists::<Block>(conn, viewer_id, target_id).await?,
            is_blocked_by: visibility.reason == VisibilityReason::BlockedByTarget,
            is_close_friend: EdgeStore::exists::<CloseFriend>(conn, viewer_id, target_id).await?,
            is_private: target.is_private,
            can_view: visibility.visible,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use sociograph_db::entities::{block, follow};
    use std::sync::Arc;

    fn test_user(id: i64, is_private: bool) -> user::Model {
        user::Model {
            id,
            username: format!("user{id}"),
            token: None,
            is_private,
            followers_count: 0,
            following_count: 0,
            blocked_count: 0,
            close_friends_count: 0,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> VisibilityService {
        let conn = Arc::new(db.into_connection());
        VisibilityService::new(EdgeStore::new(conn.clone()), UserRepository::new(conn))
    }

    #[tokio::test]
    async fn test_self_view_skips_edge_lookups() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[test_user(1, true)]]),
        );

        let visibility = svc.can_view(1, 1).await.unwrap();
        assert!(visibility.visible);
        assert_eq!(visibility.reason, VisibilityReason::SelfView);
    }

    #[tokio::test]
    async fn test_block_by_target_hides_listing() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(2, false)]])
                .append_query_results([[block::Model {
                    id: 1,
                    blocker_id: 2,
                    blocked_id: 1,
                    created_at: Utc::now().into(),
                }]]),
        );

        assert_eq!(svc.check_listing(1, 2).await.unwrap(), ListingAccess::Hidden);
    }

    #[tokio::test]
    async fn test_private_not_followed_is_denied() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(2, true)]])
                .append_query_results([Vec::<block::Model>::new()])
                .append_query_results([Vec::<follow::Model>::new()]),
        );

        let result = svc.check_listing(1, 2).await;
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_private_followed_is_visible() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(2, true)]])
                .append_query_results([Vec::<block::Model>::new()])
                .append_query_results([[follow::Model {
                    id: 4,
                    follower_id: 1,
                    following_id: 2,
                    created_at: Utc::now().into(),
                }]]),
        );

        let visibility = svc.can_view(1, 2).await.unwrap();
        assert!(visibility.visible);
        assert_eq!(visibility.reason, VisibilityReason::ApprovedFollower);
    }

    #[tokio::test]
    async fn test_missing_target() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let result = svc.can_view(1, 99).await;
        assert!(matches!(result, Err(AppError::UserNotFound(99))));
    }
}
