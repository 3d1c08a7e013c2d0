//! Database layer for the PR reviewer service
//!
//! Persists teams, users, pull requests and review slots in SQLite and
//! exposes them to the assignment service through [`ReviewStore`].

pub mod error;
pub mod models;
pub mod repos;
mod transaction;

use std::path::Path;

use async_trait::async_trait;
use reviewer_core::config::DatabaseConfig;
use reviewer_core::{ReviewStore, StoreTx};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::{debug, info};

pub use error::{Error, Result};
pub use transaction::SqliteTx;

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database at `config.path`, creating it and applying migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db_path = config.path.as_path();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;

        info!(path = %db_path.display(), "Database ready");
        Ok(Self { pool })
    }

    /// Open the database at `db_path` with default pool settings
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        Self::connect(&DatabaseConfig::new(db_path.as_ref())).await
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ReviewStore for Database {
    async fn begin(&self) -> reviewer_core::Result<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await.map_err(Error::from)?;
        debug!("Transaction started");
        Ok(Box::new(SqliteTx::new(tx)))
    }
}

#[cfg(test)]
pub(crate) async fn test_database() -> (tempfile::TempDir, Database) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let db = Database::new(temp_dir.path().join("test.db")).await.unwrap();
    (temp_dir, db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewer_core::model::{NewPullRequest, Team, TeamMember};
    use reviewer_core::{AssignmentService, ConflictKind, Error as CoreError};
    use std::sync::Arc;

    fn member(id: &str) -> TeamMember {
        TeamMember {
            user_id: id.into(),
            username: id.to_uppercase(),
            is_active: true,
        }
    }

    fn new_pr(id: &str, author: &str) -> NewPullRequest {
        NewPullRequest {
            pull_request_id: id.into(),
            name: format!("Change {}", id),
            author_id: author.into(),
        }
    }

    async fn service_with_team(ids: &[&str]) -> (tempfile::TempDir, AssignmentService) {
        let (dir, db) = test_database().await;
        let service = AssignmentService::new(Arc::new(db));
        service
            .create_team(Team {
                team_name: "backend".into(),
                members: ids.iter().map(|id| member(id)).collect(),
            })
            .await
            .unwrap();
        (dir, service)
    }

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let _db = Database::new(&db_path).await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_database_migrations() {
        let (_dir, db) = test_database().await;

        for table in ["teams", "users", "pull_requests", "pr_reviewers"] {
            let result: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
            )
            .bind(table)
            .fetch_one(db.pool())
            .await
            .unwrap();
            assert_eq!(result.0, 1, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let db = Database::new(&db_path).await.unwrap();
            let service = AssignmentService::new(Arc::new(db.clone()));
            service
                .create_team(Team {
                    team_name: "backend".into(),
                    members: vec![member("u1"), member("u2")],
                })
                .await
                .unwrap();
            db.close().await;
        }

        let db = Database::new(&db_path).await.unwrap();
        let service = AssignmentService::new(Arc::new(db));
        let team = service.get_team("backend").await.unwrap();
        assert_eq!(team.members.len(), 2);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let (_dir, db) = test_database().await;

        {
            let mut tx = db.begin().await.unwrap();
            assert!(tx.insert_team("backend").await.unwrap());
        }

        let mut tx = db.begin().await.unwrap();
        assert!(!tx.team_exists("backend").await.unwrap());
    }

    #[tokio::test]
    async fn test_assignment_flow() {
        let (_dir, service) = service_with_team(&["u1", "u2", "u3", "u4"]).await;

        let pr = service.create_pull_request(new_pr("pr-1", "u1")).await.unwrap();
        assert_eq!(pr.assigned_reviewers.len(), 2);
        assert!(!pr.assigned_reviewers.contains(&"u1".to_string()));

        let old = pr.assigned_reviewers[0].clone();
        let kept = pr.assigned_reviewers[1].clone();
        let reassigned = service.reassign_reviewer("pr-1", &old).await.unwrap();
        assert_eq!(reassigned.pull_request.assigned_reviewers[0], reassigned.replaced_by);
        assert_eq!(reassigned.pull_request.assigned_reviewers[1], kept);
        assert_ne!(reassigned.replaced_by, old);
        assert_ne!(reassigned.replaced_by, "u1");

        let merged = service.merge_pull_request("pr-1").await.unwrap();
        assert!(merged.merged_at.is_some());
        let again = service.merge_pull_request("pr-1").await.unwrap();
        assert_eq!(again.merged_at, merged.merged_at);

        let err = service.reassign_reviewer("pr-1", &kept).await.unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::PrMerged));
        let after = service.merge_pull_request("pr-1").await.unwrap();
        assert_eq!(after.assigned_reviewers, merged.assigned_reviewers);

        let stats = service.assignment_stats().await.unwrap();
        assert_eq!(stats.iter().map(|s| s.count).sum::<i64>(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reassign_of_same_slot() {
        let (_dir, service) = service_with_team(&["u1", "u2", "u3", "u4", "u5"]).await;
        let pr = service.create_pull_request(new_pr("pr-1", "u1")).await.unwrap();
        let old = pr.assigned_reviewers[0].clone();

        let first = {
            let service = service.clone();
            let old = old.clone();
            tokio::spawn(async move { service.reassign_reviewer("pr-1", &old).await })
        };
        let second = {
            let service = service.clone();
            let old = old.clone();
            tokio::spawn(async move { service.reassign_reviewer("pr-1", &old).await })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(failure.conflict_kind(), Some(ConflictKind::NotAssigned));

        let pr = service.user_reviews(&old).await.unwrap();
        assert!(pr.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_with_same_id() {
        let (_dir, service) = service_with_team(&["u1", "u2", "u3"]).await;

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.create_pull_request(new_pr("pr-1", "u1")).await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(
            failure,
            CoreError::Conflict {
                kind: ConflictKind::PrExists
            }
        ));

        let stats = service.assignment_stats().await.unwrap();
        assert_eq!(stats.iter().map(|s| s.count).sum::<i64>(), 2);
    }
}
