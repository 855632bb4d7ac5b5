//! Follow request entity (requests to follow private accounts).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a follow request.
///
/// Only `Pending` requests are live. `Accepted` and `Rejected` are terminal
/// markers kept for audit until the requester asks again.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum FollowRequestStatus {
    /// Awaiting a decision from the target.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Target accepted; a follow edge exists (or existed).
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Target rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl FollowRequestStatus {
    /// Whether the request can no longer be accepted or rejected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follow_request")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The user who sent the follow request
    pub requester_id: i64,

    /// The private user who received it
    pub target_id: i64,

    pub status: FollowRequestStatus,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RequesterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Requester,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TargetId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Target,
}

impl ActiveModelBehavior for ActiveModel {}
