//! Close friend service.

use std::collections::BTreeSet;

use serde::Serialize;
use sociograph_common::{AppError, AppResult, Page, PageRequest};
use sociograph_db::{
    entities::{Block, CloseFriend, close_friend},
    repositories::{EdgeStore, UserRepository},
};

/// Result of a bulk close-friend change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseFriendsChange {
    /// Rows actually inserted or deleted.
    pub count: u64,
    /// The inserted or deleted entries.
    pub items: Vec<close_friend::Model>,
}

/// Close friend service for business logic.
#[derive(Clone)]
pub struct CloseFriendService {
    edges: EdgeStore,
}

impl CloseFriendService {
    /// Create a new close friend service.
    #[must_use]
    pub const fn new(edges: EdgeStore) -> Self {
        Self { edges }
    }

    /// Add several users to the owner's close friends.
    ///
    /// Duplicates, the owner's own id and unknown ids are dropped; nothing left
    /// is an error. Users in a block relation with the owner and users already
    /// on the list are skipped.
    pub async fn add_many(&self, owner_id: i64, ids: &[i64]) -> AppResult<CloseFriendsChange> {
        let requested: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| *id != owner_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let txn = self.edges.begin().await?;

        let mut lock_ids = requested.clone();
        lock_ids.push(owner_id);
        let locked = UserRepository::lock_users(&txn, &lock_ids).await?;
        if !locked.iter().any(|u| u.id == owner_id) {
            return Err(AppError::UserNotFound(owner_id));
        }

        let existing: Vec<i64> = requested
            .into_iter()
            .filter(|id| locked.iter().any(|u| u.id == *id))
            .collect();
        if existing.is_empty() {
            return Err(AppError::InvalidOperation(
                "no valid user ids to add".to_string(),
            ));
        }

        let blocked = EdgeStore::linked_either_way::<Block>(&txn, owner_id, &existing).await?;
        let eligible: Vec<i64> = existing
            .into_iter()
            .filter(|id| blocked.binary_search(id).is_err())
            .collect();

        let inserted = EdgeStore::link_many::<CloseFriend>(&txn, owner_id, &eligible).await?;
        let items = EdgeStore::linked_targets::<CloseFriend>(&txn, owner_id, &inserted).await?;
        EdgeStore::commit(txn).await?;

        tracing::debug!(
            owner_id,
            requested = ids.len(),
            created = inserted.len(),
            skipped_blocked = blocked.len(),
            "Close friends added"
        );
        Ok(CloseFriendsChange {
            count: inserted.len() as u64,
            items,
        })
    }

    /// Remove several users from the owner's close friends.
    ///
    /// Ids not on the list are ignored; an empty input removes nothing.
    pub async fn remove_many(&self, owner_id: i64, ids: &[i64]) -> AppResult<CloseFriendsChange> {
        let requested: Vec<i64> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if requested.is_empty() {
            return Ok(CloseFriendsChange {
                count: 0,
                items: vec![],
            });
        }

        let txn = self.edges.begin().await?;
        let mut lock_ids = requested.clone();
        lock_ids.push(owner_id);
        UserRepository::lock_users(&txn, &lock_ids).await?;

        let items = EdgeStore::unlink_many::<CloseFriend>(&txn, owner_id, &requested).await?;
        EdgeStore::commit(txn).await?;

        tracing::debug!(owner_id, removed = items.len(), "Close friends removed");
        Ok(CloseFriendsChange {
            count: items.len() as u64,
            items,
        })
    }

    /// Add one user to the owner's close friends.
    pub async fn add(&self, owner_id: i64, friend_id: i64) -> AppResult<close_friend::Model> {
        if owner_id == friend_id {
            return Err(AppError::InvalidOperation(
                "cannot add yourself as a close friend".to_string(),
            ));
        }

        let txn = self.edges.begin().await?;
        UserRepository::lock_pair(&txn, owner_id, friend_id).await?;

        if EdgeStore::exists_between::<Block>(&txn, owner_id, friend_id).await? {
            return Err(AppError::InvalidOperation(
                "cannot add a blocked user as a close friend".to_string(),
            ));
        }

        let outcome = EdgeStore::link::<CloseFriend>(&txn, owner_id, friend_id).await?;
        let entry = EdgeStore::find_pair::<CloseFriend>(&txn, owner_id, friend_id)
            .await?
            .ok_or_else(|| AppError::Internal("close friend missing after insert".to_string()))?;
        EdgeStore::commit(txn).await?;

        tracing::debug!(owner_id, friend_id, created = outcome.is_created(), "Close friend added");
        Ok(entry)
    }

    /// Remove one user from the owner's close friends. Returns whether they were on it.
    pub async fn remove(&self, owner_id: i64, friend_id: i64) -> AppResult<bool> {
        let txn = self.edges.begin().await?;
        UserRepository::lock_users(&txn, &[owner_id, friend_id]).await?;
        let removed = EdgeStore::unlink::<CloseFriend>(&txn, owner_id, friend_id).await?;
        EdgeStore::commit(txn).await?;

        Ok(removed)
    }

    /// The owner's close friends, newest first.
    pub async fn list(
        &self,
        owner_id: i64,
        request: &PageRequest,
    ) -> AppResult<Page<close_friend::Model>> {
        EdgeStore::list_by_source::<CloseFriend>(self.edges.connection(), owner_id, request).await
    }
}
