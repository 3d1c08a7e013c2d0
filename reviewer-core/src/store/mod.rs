//! Storage port used by the assignment service.
//!
//! Every operation runs against a [`StoreTx`] obtained from
//! [`ReviewStore::begin`]. A transaction is committed explicitly; dropping
//! it without calling [`StoreTx::commit`] rolls back every write made
//! through it, so an aborted or timed-out request never leaves partial
//! slot writes behind.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{AssignmentCount, PullRequestRecord, PullRequestShort, ReviewSlot, User};
use crate::Result;

/// Source of transactions over the relational store.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Start a new transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;
}

/// Typed operations available inside one transaction.
///
/// Implementations must provide at least read-committed isolation. Two
/// transactions that both called [`StoreTx::lock_pull_request`] for the same
/// id must not interleave their reads and writes.
#[async_trait]
pub trait StoreTx: Send {
    /// Take the write lock covering `pull_request_id` before reading it.
    ///
    /// Succeeds whether or not the row exists, so creation can lock the id
    /// it is about to insert.
    async fn lock_pull_request(&mut self, pull_request_id: &str) -> Result<()>;

    /// Insert a team. Returns `false` if the name is already taken.
    async fn insert_team(&mut self, team_name: &str) -> Result<bool>;

    async fn team_exists(&mut self, team_name: &str) -> Result<bool>;

    /// Insert or overwrite a user keyed on `user_id`.
    async fn upsert_user(&mut self, user: &User) -> Result<()>;

    async fn find_user(&mut self, user_id: &str) -> Result<Option<User>>;

    /// Members of a team ordered by `user_id`.
    async fn team_members(&mut self, team_name: &str) -> Result<Vec<User>>;

    /// Returns `false` if the user does not exist.
    async fn set_user_active(&mut self, user_id: &str, is_active: bool) -> Result<bool>;

    /// Ids of active users in `team_name` that are not in `exclude`.
    ///
    /// The order is unspecified; callers sample from the returned set.
    async fn eligible_reviewers(&mut self, team_name: &str, exclude: &[&str])
        -> Result<Vec<String>>;

    async fn find_pull_request(&mut self, pull_request_id: &str)
        -> Result<Option<PullRequestRecord>>;

    /// Insert a pull request row. Returns `false` on a duplicate id.
    async fn insert_pull_request(&mut self, record: &PullRequestRecord) -> Result<bool>;

    /// Transition an open pull request to merged.
    ///
    /// Only a row still in `OPEN` is updated; returns whether it was.
    async fn mark_merged(&mut self, pull_request_id: &str, merged_at: DateTime<Utc>)
        -> Result<bool>;

    /// Slots of a pull request ordered by position.
    async fn review_slots(&mut self, pull_request_id: &str) -> Result<Vec<ReviewSlot>>;

    async fn insert_review_slot(&mut self, slot: &ReviewSlot) -> Result<()>;

    /// Replace the occupant of an existing slot in place.
    ///
    /// Returns `false` if no slot exists at that position.
    async fn update_review_slot(
        &mut self,
        pull_request_id: &str,
        position: u8,
        reviewer_id: &str,
    ) -> Result<bool>;

    /// Pull requests where `user_id` holds a slot, newest first.
    async fn reviews_for_user(&mut self, user_id: &str) -> Result<Vec<PullRequestShort>>;

    /// Current slot counts per reviewer, highest first.
    async fn assignment_counts(&mut self) -> Result<Vec<AssignmentCount>>;

    /// Commit every write made through this transaction.
    async fn commit(self: Box<Self>) -> Result<()>;
}
