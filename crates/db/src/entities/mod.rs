//! Database entities.

pub mod block;
pub mod close_friend;
pub mod follow;
pub mod follow_request;
pub mod user;

pub use block::Entity as Block;
pub use close_friend::Entity as CloseFriend;
pub use follow::Entity as Follow;
pub use follow_request::{Entity as FollowRequest, FollowRequestStatus};
pub use user::Entity as User;
