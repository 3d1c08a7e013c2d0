//! Repositories, one per table
//!
//! Each repository borrows a connection mutably, so it can run inside a
//! transaction or directly on a pooled connection.

mod pull_requests;
mod review_slots;
mod teams;
mod users;

pub use pull_requests::PullRequestRepository;
pub use review_slots::ReviewSlotRepository;
pub use teams::TeamRepository;
pub use users::UserRepository;
