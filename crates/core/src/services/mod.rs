//! Business logic services.

#![allow(missing_docs)]

pub mod blocking;
pub mod close_friend;
pub mod following;
pub mod visibility;

pub use blocking::BlockingService;
pub use close_friend::{CloseFriendService, CloseFriendsChange};
pub use following::{FollowResult, FollowingService, RequestState};
pub use visibility::{ListingAccess, Relationship, Visibility, VisibilityReason, VisibilityService};
