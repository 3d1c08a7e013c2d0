//! In-memory implementation of the storage port.
//!
//! Transactions are fully serialized: `begin` takes an owned lock on the
//! tables and works on a private copy that replaces the shared tables on
//! commit. Dropping the transaction discards the copy.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{ReviewStore, StoreTx};
use crate::model::{
    AssignmentCount, PrStatus, PullRequestRecord, PullRequestShort, ReviewSlot, User,
};
use crate::Result;

#[derive(Debug, Clone, Default)]
struct Tables {
    teams: BTreeSet<String>,
    users: BTreeMap<String, User>,
    pull_requests: BTreeMap<String, PullRequestRecord>,
    /// Keyed by (pull_request_id, position)
    slots: BTreeMap<(String, u8), String>,
}

/// Store that keeps every table in process memory
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTx { guard, working }))
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn lock_pull_request(&mut self, _pull_request_id: &str) -> Result<()> {
        // The whole store is already locked for the lifetime of the transaction.
        Ok(())
    }

    async fn insert_team(&mut self, team_name: &str) -> Result<bool> {
        Ok(self.working.teams.insert(team_name.to_string()))
    }

    async fn team_exists(&mut self, team_name: &str) -> Result<bool> {
        Ok(self.working.teams.contains(team_name))
    }

    async fn upsert_user(&mut self, user: &User) -> Result<()> {
        self.working
            .users
            .insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&mut self, user_id: &str) -> Result<Option<User>> {
        Ok(self.working.users.get(user_id).cloned())
    }

    async fn team_members(&mut self, team_name: &str) -> Result<Vec<User>> {
        Ok(self
            .working
            .users
            .values()
            .filter(|u| u.team_name == team_name)
            .cloned()
            .collect())
    }

    async fn set_user_active(&mut self, user_id: &str, is_active: bool) -> Result<bool> {
        match self.working.users.get_mut(user_id) {
            Some(user) => {
                user.is_active = is_active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn eligible_reviewers(
        &mut self,
        team_name: &str,
        exclude: &[&str],
    ) -> Result<Vec<String>> {
        Ok(self
            .working
            .users
            .values()
            .filter(|u| u.team_name == team_name && u.is_active)
            .filter(|u| !exclude.contains(&u.user_id.as_str()))
            .map(|u| u.user_id.clone())
            .collect())
    }

    async fn find_pull_request(
        &mut self,
        pull_request_id: &str,
    ) -> Result<Option<PullRequestRecord>> {
        Ok(self.working.pull_requests.get(pull_request_id).cloned())
    }

    async fn insert_pull_request(&mut self, record: &PullRequestRecord) -> Result<bool> {
        if self
            .working
            .pull_requests
            .contains_key(&record.pull_request_id)
        {
            return Ok(false);
        }
        self.working
            .pull_requests
            .insert(record.pull_request_id.clone(), record.clone());
        Ok(true)
    }

    async fn mark_merged(
        &mut self,
        pull_request_id: &str,
        merged_at: DateTime<Utc>,
    ) -> Result<bool> {
        match self.working.pull_requests.get_mut(pull_request_id) {
            Some(pr) if pr.status == PrStatus::Open => {
                pr.status = PrStatus::Merged;
                pr.merged_at = Some(merged_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn review_slots(&mut self, pull_request_id: &str) -> Result<Vec<ReviewSlot>> {
        Ok(self
            .working
            .slots
            .iter()
            .filter(|((pr_id, _), _)| pr_id == pull_request_id)
            .map(|((pr_id, position), reviewer_id)| ReviewSlot {
                pull_request_id: pr_id.clone(),
                position: *position,
                reviewer_id: reviewer_id.clone(),
            })
            .collect())
    }

    async fn insert_review_slot(&mut self, slot: &ReviewSlot) -> Result<()> {
        self.working.slots.insert(
            (slot.pull_request_id.clone(), slot.position),
            slot.reviewer_id.clone(),
        );
        Ok(())
    }

    async fn update_review_slot(
        &mut self,
        pull_request_id: &str,
        position: u8,
        reviewer_id: &str,
    ) -> Result<bool> {
        match self
            .working
            .slots
            .get_mut(&(pull_request_id.to_string(), position))
        {
            Some(occupant) => {
                *occupant = reviewer_id.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reviews_for_user(&mut self, user_id: &str) -> Result<Vec<PullRequestShort>> {
        let mut prs: Vec<&PullRequestRecord> = self
            .working
            .slots
            .iter()
            .filter(|(_, reviewer)| reviewer.as_str() == user_id)
            .filter_map(|((pr_id, _), _)| self.working.pull_requests.get(pr_id))
            .collect();
        prs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.pull_request_id.cmp(&b.pull_request_id))
        });

        Ok(prs
            .into_iter()
            .map(|pr| PullRequestShort {
                pull_request_id: pr.pull_request_id.clone(),
                name: pr.name.clone(),
                author_id: pr.author_id.clone(),
                status: pr.status,
            })
            .collect())
    }

    async fn assignment_counts(&mut self) -> Result<Vec<AssignmentCount>> {
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for reviewer in self.working.slots.values() {
            *counts.entry(reviewer.as_str()).or_default() += 1;
        }

        let mut counts: Vec<AssignmentCount> = counts
            .into_iter()
            .map(|(user_id, count)| AssignmentCount {
                user_id: user_id.to_string(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.user_id.cmp(&b.user_id)));
        Ok(counts)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
