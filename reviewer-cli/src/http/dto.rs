//! Request and response bodies that are not domain types

use reviewer_core::model::{AssignmentCount, PullRequest, PullRequestShort, Team, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    #[serde(default)]
    pub team_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    #[serde(default)]
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    #[serde(default)]
    pub pull_request_id: String,
}

/// Older clients send `old_reviewer_id`
#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    #[serde(default)]
    pub pull_request_id: String,
    #[serde(default, alias = "old_reviewer_id")]
    pub old_user_id: String,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team: Team,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub pr: PullRequest,
}

#[derive(Debug, Serialize)]
pub struct UserReviewsResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub items: Vec<AssignmentCount>,
}
