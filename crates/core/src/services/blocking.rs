//! Blocking service.

use sociograph_common::{AppError, AppResult, Page, PageRequest};
use sociograph_db::{
    entities::{Block, CloseFriend, Follow, block},
    repositories::{EdgeStore, FollowRequestRepository, UserRepository},
};

/// Blocking service for business logic.
#[derive(Clone)]
pub struct BlockingService {
    edges: EdgeStore,
}

impl BlockingService {
    /// Create a new blocking service.
    #[must_use]
    pub const fn new(edges: EdgeStore) -> Self {
        Self { edges }
    }

    /// Block a user.
    ///
    /// Removes follows, follow requests and close-friend entries between the
    /// two users in both directions, in the same transaction as the block.
    /// Blocking again returns the existing block.
    pub async fn block(&self, actor_id: i64, target_id: i64) -> AppResult<block::Model> {
        if actor_id == target_id {
            return Err(AppError::InvalidOperation(
                "cannot block yourself".to_string(),
            ));
        }

        let txn = self.edges.begin().await?;
        UserRepository::lock_pair(&txn, actor_id, target_id).await?;

        let outcome = EdgeStore::link::<Block>(&txn, actor_id, target_id).await?;

        let unfollowed = EdgeStore::unlink::<Follow>(&txn, actor_id, target_id).await?;
        let lost_follower = EdgeStore::unlink::<Follow>(&txn, target_id, actor_id).await?;
        let requests = FollowRequestRepository::delete_between(&txn, actor_id, target_id).await?;
        EdgeStore::unlink::<CloseFriend>(&txn, actor_id, target_id).await?;
        EdgeStore::unlink::<CloseFriend>(&txn, target_id, actor_id).await?;

        let block = EdgeStore::find_pair::<Block>(&txn, actor_id, target_id)
            .await?
            .ok_or_else(|| AppError::Internal("block missing after insert".to_string()))?;
        EdgeStore::commit(txn).await?;

        tracing::debug!(
            actor_id,
            target_id,
            created = outcome.is_created(),
            unfollowed,
            lost_follower,
            requests,
            "Blocked"
        );
        Ok(block)
    }

    /// Lift a block. Returns whether one existed.
    pub async fn unblock(&self, actor_id: i64, target_id: i64) -> AppResult<bool> {
        let txn = self.edges.begin().await?;
        UserRepository::lock_users(&txn, &[actor_id, target_id]).await?;
        let removed = EdgeStore::unlink::<Block>(&txn, actor_id, target_id).await?;
        EdgeStore::commit(txn).await?;

        if removed {
            tracing::debug!(actor_id, target_id, "Unblocked");
        }
        Ok(removed)
    }

    /// Users blocked by the actor, newest first.
    pub async fn list_blocked(
        &self,
        actor_id: i64,
        request: &PageRequest,
    ) -> AppResult<Page<block::Model>> {
        EdgeStore::list_by_source::<Block>(self.edges.connection(), actor_id, request).await
    }
}
