//! [`StoreTx`] backed by a SQLite transaction

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reviewer_core::model::{AssignmentCount, PullRequestRecord, PullRequestShort, ReviewSlot, User};
use reviewer_core::StoreTx;
use sqlx::{Sqlite, Transaction};

use crate::repos::{PullRequestRepository, ReviewSlotRepository, TeamRepository, UserRepository};

/// Open SQLite transaction; rolled back by sqlx when dropped uncommitted
pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteTx {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    fn teams(&mut self) -> TeamRepository<'_> {
        TeamRepository::new(&mut self.tx)
    }

    fn users(&mut self) -> UserRepository<'_> {
        UserRepository::new(&mut self.tx)
    }

    fn pull_requests(&mut self) -> PullRequestRepository<'_> {
        PullRequestRepository::new(&mut self.tx)
    }

    fn slots(&mut self) -> ReviewSlotRepository<'_> {
        ReviewSlotRepository::new(&mut self.tx)
    }
}

#[async_trait]
impl StoreTx for SqliteTx {
    async fn lock_pull_request(&mut self, pull_request_id: &str) -> reviewer_core::Result<()> {
        Ok(self.pull_requests().lock(pull_request_id).await?)
    }

    async fn insert_team(&mut self, team_name: &str) -> reviewer_core::Result<bool> {
        Ok(self.teams().insert(team_name).await?)
    }

    async fn team_exists(&mut self, team_name: &str) -> reviewer_core::Result<bool> {
        Ok(self.teams().exists(team_name).await?)
    }

    async fn upsert_user(&mut self, user: &User) -> reviewer_core::Result<()> {
        Ok(self.users().upsert(user).await?)
    }

    async fn find_user(&mut self, user_id: &str) -> reviewer_core::Result<Option<User>> {
        Ok(self.users().find(user_id).await?)
    }

    async fn team_members(&mut self, team_name: &str) -> reviewer_core::Result<Vec<User>> {
        Ok(self.users().find_by_team(team_name).await?)
    }

    async fn set_user_active(
        &mut self,
        user_id: &str,
        is_active: bool,
    ) -> reviewer_core::Result<bool> {
        Ok(self.users().set_active(user_id, is_active).await?)
    }

    async fn eligible_reviewers(
        &mut self,
        team_name: &str,
        exclude: &[&str],
    ) -> reviewer_core::Result<Vec<String>> {
        Ok(self.users().find_eligible(team_name, exclude).await?)
    }

    async fn find_pull_request(
        &mut self,
        pull_request_id: &str,
    ) -> reviewer_core::Result<Option<PullRequestRecord>> {
        Ok(self.pull_requests().find(pull_request_id).await?)
    }

    async fn insert_pull_request(
        &mut self,
        record: &PullRequestRecord,
    ) -> reviewer_core::Result<bool> {
        Ok(self.pull_requests().insert(record).await?)
    }

    async fn mark_merged(
        &mut self,
        pull_request_id: &str,
        merged_at: DateTime<Utc>,
    ) -> reviewer_core::Result<bool> {
        Ok(self.pull_requests().mark_merged(pull_request_id, merged_at).await?)
    }

    async fn review_slots(&mut self, pull_request_id: &str) -> reviewer_core::Result<Vec<ReviewSlot>> {
        Ok(self.slots().find_by_pull_request(pull_request_id).await?)
    }

    async fn insert_review_slot(&mut self, slot: &ReviewSlot) -> reviewer_core::Result<()> {
        Ok(self.slots().insert(slot).await?)
    }

    async fn update_review_slot(
        &mut self,
        pull_request_id: &str,
        position: u8,
        reviewer_id: &str,
    ) -> reviewer_core::Result<bool> {
        Ok(self
            .slots()
            .update_reviewer(pull_request_id, position, reviewer_id)
            .await?)
    }

    async fn reviews_for_user(
        &mut self,
        user_id: &str,
    ) -> reviewer_core::Result<Vec<PullRequestShort>> {
        Ok(self.pull_requests().find_by_reviewer(user_id).await?)
    }

    async fn assignment_counts(&mut self) -> reviewer_core::Result<Vec<AssignmentCount>> {
        Ok(self.slots().count_by_reviewer().await?)
    }

    async fn commit(self: Box<Self>) -> reviewer_core::Result<()> {
        self.tx.commit().await.map_err(crate::Error::from)?;
        Ok(())
    }
}
