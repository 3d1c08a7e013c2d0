//! Row types and their mapping onto the domain model

use chrono::{DateTime, Utc};
use reviewer_core::model::{
    AssignmentCount, PrStatus, PullRequestRecord, PullRequestShort, ReviewSlot, User,
};

use crate::{Error, Result};

/// Row of the `users` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            username: row.username,
            team_name: row.team_name,
            is_active: row.is_active,
        }
    }
}

/// Row of the `pull_requests` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PullRequestRow {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl TryFrom<PullRequestRow> for PullRequestRecord {
    type Error = Error;

    fn try_from(row: PullRequestRow) -> Result<Self> {
        Ok(PullRequestRecord {
            status: parse_status(&row.status)?,
            pull_request_id: row.pull_request_id,
            name: row.pull_request_name,
            author_id: row.author_id,
            created_at: row.created_at,
            merged_at: row.merged_at,
        })
    }
}

/// Pull request columns used by review listings
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PullRequestShortRow {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

impl TryFrom<PullRequestShortRow> for PullRequestShort {
    type Error = Error;

    fn try_from(row: PullRequestShortRow) -> Result<Self> {
        Ok(PullRequestShort {
            status: parse_status(&row.status)?,
            pull_request_id: row.pull_request_id,
            name: row.pull_request_name,
            author_id: row.author_id,
        })
    }
}

/// Row of the `pr_reviewers` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewSlotRow {
    pub pr_id: String,
    pub position: i64,
    pub reviewer_id: String,
}

impl TryFrom<ReviewSlotRow> for ReviewSlot {
    type Error = Error;

    fn try_from(row: ReviewSlotRow) -> Result<Self> {
        let position = u8::try_from(row.position)
            .map_err(|_| Error::InvalidData(format!("slot position {}", row.position)))?;
        Ok(ReviewSlot {
            pull_request_id: row.pr_id,
            position,
            reviewer_id: row.reviewer_id,
        })
    }
}

/// Aggregated slot count per reviewer
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssignmentCountRow {
    pub user_id: String,
    pub count: i64,
}

impl From<AssignmentCountRow> for AssignmentCount {
    fn from(row: AssignmentCountRow) -> Self {
        AssignmentCount {
            user_id: row.user_id,
            count: row.count,
        }
    }
}

fn parse_status(status: &str) -> Result<PrStatus> {
    status
        .parse()
        .map_err(|_| Error::InvalidData(format!("pull request status {:?}", status)))
}
