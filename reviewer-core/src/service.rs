//! Assignment service: the operations exposed to request handlers.
//!
//! Every multi-step read-then-write sequence runs inside one store
//! transaction. Mutating flows lock the pull request row before reading it,
//! and any early return drops the transaction, which rolls it back.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::require;
use crate::model::{
    AssignmentCount, NewPullRequest, PullRequest, PullRequestRecord, PullRequestShort,
    Reassignment, ReviewSlot, Team, TeamMember, User, MAX_REVIEWERS,
};
use crate::selection::select_candidates;
use crate::store::{ReviewStore, StoreTx};
use crate::{ConflictKind, Error, Result};

/// Team, user and pull request operations with automatic reviewer assignment
#[derive(Clone)]
pub struct AssignmentService {
    store: Arc<dyn ReviewStore>,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    /// Create a team and upsert its members into it.
    ///
    /// Members that already exist are moved to this team.
    pub async fn create_team(&self, team: Team) -> Result<Team> {
        require("team_name", &team.team_name)?;
        for member in &team.members {
            require("user_id", &member.user_id)?;
        }

        let mut tx = self.store.begin().await?;
        if !tx.insert_team(&team.team_name).await? {
            return Err(Error::conflict(ConflictKind::TeamExists));
        }
        for member in &team.members {
            tx.upsert_user(&User::from_member(member, &team.team_name))
                .await?;
        }
        tx.commit().await?;

        info!(team = %team.team_name, members = team.members.len(), "Team created");
        Ok(team)
    }

    /// Look up a team and its members.
    pub async fn get_team(&self, team_name: &str) -> Result<Team> {
        require("team_name", team_name)?;

        let mut tx = self.store.begin().await?;
        if !tx.team_exists(team_name).await? {
            return Err(Error::NotFound("team not found".to_string()));
        }
        let members = tx.team_members(team_name).await?;
        tx.commit().await?;

        Ok(Team {
            team_name: team_name.to_string(),
            members: members.into_iter().map(TeamMember::from).collect(),
        })
    }

    /// Toggle a user's `is_active` flag.
    ///
    /// Existing review slots held by the user are left untouched.
    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        require("user_id", user_id)?;

        let mut tx = self.store.begin().await?;
        if !tx.set_user_active(user_id, is_active).await? {
            return Err(Error::NotFound("user not found".to_string()));
        }
        let user = tx
            .find_user(user_id)
            .await?
            .ok_or_else(|| Error::NotFound("user not found".to_string()))?;
        tx.commit().await?;

        info!(user = %user_id, is_active, "User activity updated");
        Ok(user)
    }

    /// Pull requests the user currently reviews, newest first.
    pub async fn user_reviews(&self, user_id: &str) -> Result<Vec<PullRequestShort>> {
        require("user_id", user_id)?;

        let mut tx = self.store.begin().await?;
        let reviews = tx.reviews_for_user(user_id).await?;
        tx.commit().await?;
        Ok(reviews)
    }

    /// Create an open pull request and assign up to two reviewers from the
    /// author's team.
    pub async fn create_pull_request(&self, new_pr: NewPullRequest) -> Result<PullRequest> {
        require("pull_request_id", &new_pr.pull_request_id)?;
        require("author_id", &new_pr.author_id)?;

        let mut tx = self.store.begin().await?;
        tx.lock_pull_request(&new_pr.pull_request_id).await?;

        let author = tx
            .find_user(&new_pr.author_id)
            .await?
            .ok_or_else(|| Error::NotFound("author not found".to_string()))?;

        if tx
            .find_pull_request(&new_pr.pull_request_id)
            .await?
            .is_some()
        {
            return Err(Error::conflict(ConflictKind::PrExists));
        }

        let record = PullRequestRecord::open(
            &new_pr.pull_request_id,
            &new_pr.name,
            &author.user_id,
            Utc::now(),
        );
        if !tx.insert_pull_request(&record).await? {
            // Lost a race with a concurrent create of the same id
            warn!(pr = %record.pull_request_id, "Duplicate pull request rejected by store");
            return Err(Error::conflict(ConflictKind::PrExists));
        }

        let reviewers = select_candidates(
            tx.as_mut(),
            &author.team_name,
            &[author.user_id.as_str()],
            MAX_REVIEWERS,
        )
        .await?;

        for (index, reviewer_id) in reviewers.iter().enumerate() {
            tx.insert_review_slot(&ReviewSlot {
                pull_request_id: record.pull_request_id.clone(),
                position: index as u8 + 1,
                reviewer_id: reviewer_id.clone(),
            })
            .await?;
        }

        let pr = load_pull_request(tx.as_mut(), &record.pull_request_id).await?;
        tx.commit().await?;

        info!(
            pr = %pr.pull_request_id,
            author = %pr.author_id,
            reviewers = ?pr.assigned_reviewers,
            "Pull request created"
        );
        Ok(pr)
    }

    /// Merge a pull request. Merging an already merged pull request returns
    /// it unchanged.
    pub async fn merge_pull_request(&self, pull_request_id: &str) -> Result<PullRequest> {
        require("pull_request_id", pull_request_id)?;

        let mut tx = self.store.begin().await?;
        tx.lock_pull_request(pull_request_id).await?;

        let record = tx
            .find_pull_request(pull_request_id)
            .await?
            .ok_or_else(|| Error::NotFound("PR not found".to_string()))?;

        if record.is_merged() {
            debug!(pr = %pull_request_id, "Pull request already merged");
        } else if tx.mark_merged(pull_request_id, Utc::now()).await? {
            info!(pr = %pull_request_id, "Pull request merged");
        }

        let pr = load_pull_request(tx.as_mut(), pull_request_id).await?;
        tx.commit().await?;
        Ok(pr)
    }

    /// Replace `old_user_id` on a pull request with another active member of
    /// that user's current team.
    ///
    /// The replacement takes over the same slot position. The author and the
    /// other current reviewer are never chosen.
    pub async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_user_id: &str,
    ) -> Result<Reassignment> {
        require("pull_request_id", pull_request_id)?;
        require("old_user_id", old_user_id)?;

        let mut tx = self.store.begin().await?;
        tx.lock_pull_request(pull_request_id).await?;

        let record = tx
            .find_pull_request(pull_request_id)
            .await?
            .ok_or_else(|| Error::NotFound("PR not found".to_string()))?;
        if record.is_merged() {
            return Err(Error::conflict(ConflictKind::PrMerged));
        }

        let slots = tx.review_slots(pull_request_id).await?;
        let slot = slots
            .iter()
            .find(|s| s.reviewer_id == old_user_id)
            .ok_or_else(|| Error::conflict(ConflictKind::NotAssigned))?;

        let old_user = tx
            .find_user(old_user_id)
            .await?
            .ok_or_else(|| Error::NotFound("user not found".to_string()))?;

        let mut exclude = vec![old_user_id, record.author_id.as_str()];
        exclude.extend(
            slots
                .iter()
                .filter(|s| s.position != slot.position)
                .map(|s| s.reviewer_id.as_str()),
        );

        let replacement = select_candidates(tx.as_mut(), &old_user.team_name, &exclude, 1)
            .await?
            .pop()
            .ok_or_else(|| Error::conflict(ConflictKind::NoCandidate))?;

        if !tx
            .update_review_slot(pull_request_id, slot.position, &replacement)
            .await?
        {
            return Err(Error::Storage(format!(
                "review slot {} of {} vanished inside transaction",
                slot.position, pull_request_id
            )));
        }

        let pull_request = load_pull_request(tx.as_mut(), pull_request_id).await?;
        tx.commit().await?;

        info!(
            pr = %pull_request_id,
            old = %old_user_id,
            new = %replacement,
            position = slot.position,
            "Reviewer reassigned"
        );
        Ok(Reassignment {
            pull_request,
            replaced_by: replacement,
        })
    }

    /// Current review slot counts per user, highest first.
    pub async fn assignment_stats(&self) -> Result<Vec<AssignmentCount>> {
        let mut tx = self.store.begin().await?;
        let counts = tx.assignment_counts().await?;
        tx.commit().await?;
        Ok(counts)
    }
}

/// Read a pull request and its slots back through the open transaction
async fn load_pull_request(tx: &mut dyn StoreTx, pull_request_id: &str) -> Result<PullRequest> {
    let record = tx
        .find_pull_request(pull_request_id)
        .await?
        .ok_or_else(|| Error::NotFound("PR not found".to_string()))?;
    let slots = tx.review_slots(pull_request_id).await?;
    Ok(PullRequest::from_parts(record, slots))
}
