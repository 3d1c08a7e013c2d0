//! Route handlers

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use reviewer_core::model::{NewPullRequest, Reassignment, Team};
use serde_json::{json, Value};

use super::dto::{
    MergeRequest, PullRequestResponse, ReassignRequest, SetActiveRequest, StatsResponse,
    TeamQuery, TeamResponse, UserQuery, UserResponse, UserReviewsResponse,
};
use super::error::ApiError;
use super::AppState;

type ApiResult<T> = Result<T, ApiError>;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn add_team(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Team>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TeamResponse>)> {
    let Json(team) = payload?;
    let team = state.service.create_team(team).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

pub async fn get_team(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> ApiResult<Json<Team>> {
    let Query(query) = query?;
    let team = state.service.get_team(&query.team_name).await?;
    Ok(Json(team))
}

pub async fn set_user_active(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(req) = payload?;
    let user = state
        .service
        .set_user_active(&req.user_id, req.is_active)
        .await?;
    Ok(Json(UserResponse { user }))
}

pub async fn user_reviews(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Json<UserReviewsResponse>> {
    let Query(query) = query?;
    let pull_requests = state.service.user_reviews(&query.user_id).await?;
    Ok(Json(UserReviewsResponse {
        user_id: query.user_id,
        pull_requests,
    }))
}

pub async fn create_pull_request(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewPullRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PullRequestResponse>)> {
    let Json(new_pr) = payload?;
    let pr = state.service.create_pull_request(new_pr).await?;
    Ok((StatusCode::CREATED, Json(PullRequestResponse { pr })))
}

pub async fn merge_pull_request(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> ApiResult<Json<PullRequestResponse>> {
    let Json(req) = payload?;
    let pr = state.service.merge_pull_request(&req.pull_request_id).await?;
    Ok(Json(PullRequestResponse { pr }))
}

pub async fn reassign_reviewer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> ApiResult<Json<Reassignment>> {
    let Json(req) = payload?;
    let reassignment = state
        .service
        .reassign_reviewer(&req.pull_request_id, &req.old_user_id)
        .await?;
    Ok(Json(reassignment))
}

pub async fn assignment_stats(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<StatsResponse>> {
    let items = state.service.assignment_stats().await?;
    Ok(Json(StatsResponse { items }))
}
