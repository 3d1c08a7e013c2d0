//! HTTP surface of the reviewer service

mod dto;
mod error;
mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use reviewer_core::AssignmentService;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// State shared by every handler
pub struct AppState {
    pub service: AssignmentService,
}

/// Build the application router.
///
/// Requests running longer than `request_timeout` are aborted, which drops
/// any open store transaction and rolls it back.
pub fn router(service: AssignmentService, request_timeout: Duration) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/team/add", post(handlers::add_team))
        .route("/team/get", get(handlers::get_team))
        .route("/users/setIsActive", post(handlers::set_user_active))
        .route("/users/getReview", get(handlers::user_reviews))
        .route("/pullRequest/create", post(handlers::create_pull_request))
        .route("/pullRequest/merge", post(handlers::merge_pull_request))
        .route("/pullRequest/reassign", post(handlers::reassign_reviewer))
        .route("/stats/assignments-by-user", get(handlers::assignment_stats))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::map_response(timeout_envelope))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Give the bare 408 produced by the timeout layer the usual error body
async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return ApiError::timeout().into_response();
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use reviewer_core::{InMemoryStore, ReviewStore};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let service = AssignmentService::new(Arc::new(InMemoryStore::new()));
        router(service, Duration::from_secs(5))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        send(app, Method::POST, uri, Some(body)).await
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Method::GET, uri, None).await
    }

    async fn add_backend_team(app: &Router) {
        let (status, _) = post_json(
            app,
            "/team/add",
            json!({
                "team_name": "backend",
                "members": [
                    {"user_id": "u3", "username": "Carol", "is_active": true},
                    {"user_id": "u1", "username": "Alice", "is_active": true},
                    {"user_id": "u2", "username": "Bob", "is_active": true},
                    {"user_id": "u4", "username": "Dave", "is_active": false}
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_healthz() {
        let (status, body) = get_json(&app(), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_team_add_and_get() {
        let app = app();
        add_backend_team(&app).await;

        let (status, body) = get_json(&app, "/team/get?team_name=backend").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["team_name"], "backend");
        let ids: Vec<_> = body["members"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["user_id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["u1", "u2", "u3", "u4"]);

        let (status, body) = post_json(&app, "/team/add", json!({"team_name": "backend", "members": []})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "TEAM_EXISTS");

        let (status, body) = get_json(&app, "/team/get?team_name=payments").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, body) = get_json(&app, "/team/get").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/pullRequest/create")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_set_is_active() {
        let app = app();
        add_backend_team(&app).await;

        let (status, body) = post_json(
            &app,
            "/users/setIsActive",
            json!({"user_id": "u2", "is_active": false}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["is_active"], false);
        assert_eq!(body["user"]["team_name"], "backend");

        let (status, _) = post_json(
            &app,
            "/users/setIsActive",
            json!({"user_id": "ghost", "is_active": true}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pull_request_lifecycle() {
        let app = app();
        add_backend_team(&app).await;

        let (status, body) = post_json(
            &app,
            "/pullRequest/create",
            json!({"pull_request_id": "pr-1", "pull_request_name": "Add cache", "author_id": "u1"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let pr = &body["pr"];
        assert_eq!(pr["status"], "OPEN");
        assert_eq!(pr["pull_request_name"], "Add cache");
        assert!(pr.get("createdAt").is_some());
        assert!(pr.get("mergedAt").is_none());
        let mut reviewers: Vec<String> = pr["assigned_reviewers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_str().unwrap().to_string())
            .collect();
        reviewers.sort();
        assert_eq!(reviewers, vec!["u2", "u3"]);

        let (status, body) = post_json(
            &app,
            "/pullRequest/create",
            json!({"pull_request_id": "pr-1", "pull_request_name": "Again", "author_id": "u1"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "PR_EXISTS");

        let (status, body) = get_json(&app, "/users/getReview?user_id=u2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "u2");
        assert_eq!(body["pull_requests"][0]["pull_request_id"], "pr-1");

        // u4 is inactive and u1 is the author, so nobody can replace u2
        let (status, body) = post_json(
            &app,
            "/pullRequest/reassign",
            json!({"pull_request_id": "pr-1", "old_reviewer_id": "u2"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "NO_CANDIDATE");

        let (status, body) = post_json(&app, "/pullRequest/merge", json!({"pull_request_id": "pr-1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pr"]["status"], "MERGED");
        let merged_at = body["pr"]["mergedAt"].clone();
        assert!(merged_at.is_string());

        let (status, body) = post_json(&app, "/pullRequest/merge", json!({"pull_request_id": "pr-1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pr"]["mergedAt"], merged_at);

        let (status, body) = post_json(
            &app,
            "/pullRequest/reassign",
            json!({"pull_request_id": "pr-1", "old_user_id": "u2"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "PR_MERGED");

        let (_, body) = post_json(&app, "/pullRequest/merge", json!({"pull_request_id": "pr-1"})).await;
        let mut after: Vec<String> = body["pr"]["assigned_reviewers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_str().unwrap().to_string())
            .collect();
        after.sort();
        assert_eq!(after, reviewers);
    }

    #[tokio::test]
    async fn test_reassign_and_stats() {
        let app = app();
        add_backend_team(&app).await;
        post_json(
            &app,
            "/users/setIsActive",
            json!({"user_id": "u4", "is_active": true}),
        )
        .await;

        let (_, body) = post_json(
            &app,
            "/pullRequest/create",
            json!({"pull_request_id": "pr-1", "pull_request_name": "Add cache", "author_id": "u1"}),
        )
        .await;
        let reviewers = body["pr"]["assigned_reviewers"].as_array().unwrap().clone();
        let old = reviewers[0].as_str().unwrap().to_string();
        let kept = reviewers[1].as_str().unwrap().to_string();

        let (status, body) = post_json(
            &app,
            "/pullRequest/reassign",
            json!({"pull_request_id": "pr-1", "old_user_id": old}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let replaced_by = body["replaced_by"].as_str().unwrap().to_string();
        assert_ne!(replaced_by, old);
        assert_ne!(replaced_by, kept);
        assert_ne!(replaced_by, "u1");
        assert_eq!(body["pr"]["assigned_reviewers"][0], replaced_by.as_str());
        assert_eq!(body["pr"]["assigned_reviewers"][1], kept.as_str());

        let (status, body) = post_json(
            &app,
            "/pullRequest/reassign",
            json!({"pull_request_id": "pr-1", "old_user_id": old}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "NOT_ASSIGNED");

        let (status, body) = get_json(&app, "/stats/assignments-by-user").await;
        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i["count"] == 1));
        assert!(items.iter().all(|i| i["user_id"] != old.as_str()));
    }

    #[tokio::test]
    async fn test_invalid_query_uses_error_envelope() {
        let app = app();
        add_backend_team(&app).await;

        let (status, body) = get_json(&app, "/team/get?team_name=backend&team_name=frontend").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(body["error"]["message"], "invalid query");
    }

    #[tokio::test]
    async fn test_timed_out_request_uses_error_envelope() {
        let store = InMemoryStore::new();
        let app = router(
            AssignmentService::new(Arc::new(store.clone())),
            Duration::from_millis(50),
        );

        // Holding a transaction keeps the request waiting on the store lock
        let held = store.begin().await.unwrap();
        let (status, body) = get_json(&app, "/stats/assignments-by-user").await;
        drop(held);

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["error"]["code"], "TIMEOUT");
        assert_eq!(body["error"]["message"], "request timed out");
    }
}
