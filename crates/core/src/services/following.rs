//! Following service.
//!
//! Follow, unfollow and the follow-request lifecycle. Every mutation runs in a
//! single transaction that writes the edge and its counters together and starts
//! by locking both user rows, lowest id first. Two transactions on the same
//! pair therefore queue on the first row instead of deadlocking on counters.

use crate::services::visibility::{ListingAccess, VisibilityService};
use serde::Serialize;
use sociograph_common::{AppError, AppResult, Page, PageRequest};
use sociograph_db::{
    entities::{Block, Follow, FollowRequestStatus, follow, follow_request},
    repositories::{EdgeStore, FollowRequestRepository, LinkOutcome, UserRepository},
};

/// Result of a follow attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FollowResult {
    /// A follow edge was created.
    Followed,
    /// The target is private; a pending request now exists.
    RequestCreated,
    /// The edge already existed. Nothing changed.
    AlreadyFollowing,
}

/// State of a follow request after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    Pending,
    Accepted,
    Rejected,
    /// The pending request was withdrawn and deleted.
    Cancelled,
}

impl From<FollowRequestStatus> for RequestState {
    fn from(status: FollowRequestStatus) -> Self {
        match status {
            FollowRequestStatus::Pending => Self::Pending,
            FollowRequestStatus::Accepted => Self::Accepted,
            FollowRequestStatus::Rejected => Self::Rejected,
        }
    }
}

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    edges: EdgeStore,
    visibility: VisibilityService,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(edges: EdgeStore, visibility: VisibilityService) -> Self {
        Self { edges, visibility }
    }

    /// Follow a user.
    ///
    /// Following a private user creates (or renews) a follow request instead.
    pub async fn follow(&self, actor_id: i64, target_id: i64) -> AppResult<FollowResult> {
        if actor_id == target_id {
            return Err(AppError::InvalidOperation(
                "cannot follow yourself".to_string(),
            ));
        }

        let txn = self.edges.begin().await?;
        let (_, target) = UserRepository::lock_pair(&txn, actor_id, target_id).await?;

        if EdgeStore::exists::<Follow>(&txn, actor_id, target_id).await? {
            return Ok(FollowResult::AlreadyFollowing);
        }

        if EdgeStore::exists_between::<Block>(&txn, actor_id, target_id).await? {
            return Err(AppError::InvalidOperation(
                "cannot follow while a block is in effect".to_string(),
            ));
        }

        if target.is_private {
            let request =
                FollowRequestRepository::upsert_pending(&txn, actor_id, target_id).await?;
            EdgeStore::commit(txn).await?;

            tracing::debug!(actor_id, target_id, request_id = request.id, "Follow request created");
            return Ok(FollowResult::RequestCreated);
        }

        let outcome = EdgeStore::link::<Follow>(&txn, actor_id, target_id).await?;
        FollowRequestRepository::delete_pair(&txn, actor_id, target_id).await?;
        EdgeStore::commit(txn).await?;

        match outcome {
            LinkOutcome::Created => {
                tracing::debug!(actor_id, target_id, "Followed");
                Ok(FollowResult::Followed)
            }
            LinkOutcome::AlreadyExists => Ok(FollowResult::AlreadyFollowing),
        }
    }

    /// Unfollow a user.
    pub async fn unfollow(&self, actor_id: i64, target_id: i64) -> AppResult<()> {
        if actor_id == target_id {
            return Err(AppError::InvalidOperation(
                "cannot unfollow yourself".to_string(),
            ));
        }

        let txn = self.edges.begin().await?;
        UserRepository::lock_users(&txn, &[actor_id, target_id]).await?;

        if !EdgeStore::unlink::<Follow>(&txn, actor_id, target_id).await? {
            return Err(AppError::InvalidOperation("not following".to_string()));
        }
        EdgeStore::commit(txn).await?;

        tracing::debug!(actor_id, target_id, "Unfollowed");
        Ok(())
    }

    /// Remove `follower_id` from the actor's followers.
    pub async fn remove_follower(&self, actor_id: i64, follower_id: i64) -> AppResult<()> {
        let txn = self.edges.begin().await?;
        UserRepository::lock_users(&txn, &[actor_id, follower_id]).await?;

        if !EdgeStore::unlink::<Follow>(&txn, follower_id, actor_id).await? {
            return Err(AppError::InvalidOperation(
                "this user does not follow you".to_string(),
            ));
        }
        EdgeStore::commit(txn).await?;

        tracing::debug!(actor_id, follower_id, "Follower removed");
        Ok(())
    }

    /// Accept a pending follow request sent to the actor.
    pub async fn accept_request(&self, actor_id: i64, requester_id: i64) -> AppResult<RequestState> {
        let txn = self.edges.begin().await?;
        UserRepository::lock_pair(&txn, requester_id, actor_id).await?;

        if !FollowRequestRepository::resolve(
            &txn,
            requester_id,
            actor_id,
            FollowRequestStatus::Accepted,
        )
        .await?
        {
            return Err(AppError::NotFound("follow request".to_string()));
        }

        let outcome = EdgeStore::link::<Follow>(&txn, requester_id, actor_id).await?;
        EdgeStore::commit(txn).await?;

        tracing::debug!(
            actor_id,
            requester_id,
            created = outcome.is_created(),
            "Follow request accepted"
        );
        Ok(RequestState::Accepted)
    }

    /// Reject a pending follow request sent to the actor.
    pub async fn reject_request(&self, actor_id: i64, requester_id: i64) -> AppResult<RequestState> {
        let resolved = FollowRequestRepository::resolve(
            self.edges.connection(),
            requester_id,
            actor_id,
            FollowRequestStatus::Rejected,
        )
        .await?;

        if !resolved {
            return Err(AppError::NotFound("follow request".to_string()));
        }

        tracing::debug!(actor_id, requester_id, "Follow request rejected");
        Ok(RequestState::Rejected)
    }

    /// Withdraw the actor's request to `target_id`.
    ///
    /// Only a pending request is deleted. A decided request is left alone and
    /// its status returned.
    pub async fn cancel_request(&self, actor_id: i64, target_id: i64) -> AppResult<RequestState> {
        let conn = self.edges.connection();
        let request = FollowRequestRepository::find_pair(conn, actor_id, target_id)
            .await?
            .ok_or_else(|| AppError::InvalidOperation("no follow request to cancel".to_string()))?;

        if request.status.is_terminal() {
            return Ok(request.status.into());
        }

        if !FollowRequestRepository::delete_pending(conn, actor_id, target_id).await? {
            // Decided between the read and the delete.
            let current = FollowRequestRepository::find_pair(conn, actor_id, target_id).await?;
            return Ok(current.map_or(RequestState::Cancelled, |r| r.status.into()));
        }

        tracing::debug!(actor_id, target_id, "Follow request cancelled");
        Ok(RequestState::Cancelled)
    }

    /// Followers of `target_id`, newest first.
    pub async fn list_followers(
        &self,
        viewer_id: i64,
        target_id: i64,
        request: &PageRequest,
    ) -> AppResult<Page<follow::Model>> {
        match self.visibility.check_listing(viewer_id, target_id).await? {
            ListingAccess::Hidden => Ok(Page::empty()),
            ListingAccess::Allowed => {
                EdgeStore::list_by_target::<Follow>(self.edges.connection(), target_id, request)
                    .await
            }
        }
    }

    /// Users `target_id` follows, newest first.
    pub async fn list_following(
        &self,
        viewer_id: i64,
        target_id: i64,
        request: &PageRequest,
    ) -> AppResult<Page<follow::Model>> {
        match self.visibility.check_listing(viewer_id, target_id).await? {
            ListingAccess::Hidden => Ok(Page::empty()),
            ListingAccess::Allowed => {
                EdgeStore::list_by_source::<Follow>(self.edges.connection(), target_id, request)
                    .await
            }
        }
    }

    /// Pending requests addressed to the actor.
    pub async fn list_incoming_requests(
        &self,
        actor_id: i64,
        request: &PageRequest,
    ) -> AppResult<Page<follow_request::Model>> {
        FollowRequestRepository::list_incoming(self.edges.connection(), actor_id, request).await
    }

    /// Pending requests sent by the actor.
    pub async fn list_outgoing_requests(
        &self,
        actor_id: i64,
        request: &PageRequest,
    ) -> AppResult<Page<follow_request::Model>> {
        FollowRequestRepository::list_outgoing(self.edges.connection(), actor_id, request).await
    }
}
