//! Database repositories.

mod counter;
mod edge;
mod follow_request;
mod user;

pub use counter::{Counter, CounterLedger};
pub use edge::{CountedEdge, Edge, EdgeStore, LinkOutcome};
pub use follow_request::FollowRequestRepository;
pub use user::UserRepository;
