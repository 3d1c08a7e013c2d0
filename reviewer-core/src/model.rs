//! Domain models for teams, users, pull requests and review slots

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Maximum number of review slots on a pull request
pub const MAX_REVIEWERS: usize = 2;

/// Team member as supplied on team creation and returned by team lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

/// Team with its current members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

/// User record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl User {
    /// Build a user belonging to `team_name` from a team member entry
    pub fn from_member(member: &TeamMember, team_name: impl Into<String>) -> Self {
        Self {
            user_id: member.user_id.clone(),
            username: member.username.clone(),
            team_name: team_name.into(),
            is_active: member.is_active,
        }
    }
}

impl From<User> for TeamMember {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            is_active: user.is_active,
        }
    }
}

/// Pull request lifecycle status
///
/// The only transition is `Open` -> `Merged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrStatus {
    Open,
    Merged,
}

impl PrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrStatus::Open => "OPEN",
            PrStatus::Merged => "MERGED",
        }
    }
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(PrStatus::Open),
            "MERGED" => Ok(PrStatus::Merged),
            other => Err(Error::Storage(format!("unknown PR status: {}", other))),
        }
    }
}

/// Stored pull request row, without its review slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub pull_request_id: String,
    pub name: String,
    pub author_id: String,
    pub status: PrStatus,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequestRecord {
    /// Create a new open pull request
    pub fn open(
        pull_request_id: impl Into<String>,
        name: impl Into<String>,
        author_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            pull_request_id: pull_request_id.into(),
            name: name.into(),
            author_id: author_id.into(),
            status: PrStatus::Open,
            created_at,
            merged_at: None,
        }
    }

    pub fn is_merged(&self) -> bool {
        self.status == PrStatus::Merged
    }
}

/// Positional reviewer assignment on a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSlot {
    pub pull_request_id: String,
    /// 1 or 2
    pub position: u8,
    pub reviewer_id: String,
}

/// Pull request with its assigned reviewers, in slot order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub pull_request_id: String,
    #[serde(rename = "pull_request_name")]
    pub name: String,
    pub author_id: String,
    pub status: PrStatus,
    pub assigned_reviewers: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none", default)]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Assemble a pull request from its row and slots
    pub fn from_parts(record: PullRequestRecord, mut slots: Vec<ReviewSlot>) -> Self {
        slots.sort_by_key(|s| s.position);
        Self {
            pull_request_id: record.pull_request_id,
            name: record.name,
            author_id: record.author_id,
            status: record.status,
            assigned_reviewers: slots.into_iter().map(|s| s.reviewer_id).collect(),
            created_at: record.created_at,
            merged_at: record.merged_at,
        }
    }
}

/// Short pull request view used in review listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    #[serde(rename = "pull_request_name")]
    pub name: String,
    pub author_id: String,
    pub status: PrStatus,
}

/// Input for pull request creation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPullRequest {
    pub pull_request_id: String,
    #[serde(rename = "pull_request_name", default)]
    pub name: String,
    pub author_id: String,
}

/// Outcome of a reviewer reassignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reassignment {
    #[serde(rename = "pr")]
    pub pull_request: PullRequest,
    pub replaced_by: String,
}

/// Number of current review slots held by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentCount {
    pub user_id: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        assert_eq!("MERGED".parse::<PrStatus>().unwrap(), PrStatus::Merged);
        assert_eq!(PrStatus::Open.to_string(), "OPEN");
        assert!("closed".parse::<PrStatus>().is_err());
    }

    #[test]
    fn test_from_parts_orders_by_position() {
        let record = PullRequestRecord::open("pr-1", "Add cache", "u1", Utc::now());
        let slots = vec![
            ReviewSlot {
                pull_request_id: "pr-1".into(),
                position: 2,
                reviewer_id: "u3".into(),
            },
            ReviewSlot {
                pull_request_id: "pr-1".into(),
                position: 1,
                reviewer_id: "u2".into(),
            },
        ];

        let pr = PullRequest::from_parts(record, slots);
        assert_eq!(pr.assigned_reviewers, vec!["u2", "u3"]);
    }

    #[test]
    fn test_pull_request_json_shape() {
        let record = PullRequestRecord::open("pr-1", "Add cache", "u1", Utc::now());
        let pr = PullRequest::from_parts(record, Vec::new());

        let json = serde_json::to_value(&pr).unwrap();
        assert_eq!(json["pull_request_name"], "Add cache");
        assert_eq!(json["status"], "OPEN");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("mergedAt").is_none());
    }
}
