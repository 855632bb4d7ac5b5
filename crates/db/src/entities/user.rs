//! User entity.
//!
//! Owned by the identity subsystem. The graph engine reads `is_private` and
//! writes only the denormalized relationship counters.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique)]
    pub username: String,

    /// Bearer credential issued by the identity subsystem
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Private accounts turn follows into follow requests
    #[sea_orm(default_value = false)]
    pub is_private: bool,

    /// Followers count (denormalized)
    #[sea_orm(default_value = 0)]
    pub followers_count: i64,

    /// Following count (denormalized)
    #[sea_orm(default_value = 0)]
    pub following_count: i64,

    /// Blocked users count (denormalized)
    #[sea_orm(default_value = 0)]
    pub blocked_count: i64,

    /// Close friends count (denormalized)
    #[sea_orm(default_value = 0)]
    pub close_friends_count: i64,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
