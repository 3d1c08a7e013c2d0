//! Repository for pull request records

use chrono::{DateTime, Utc};
use reviewer_core::model::{PullRequestRecord, PullRequestShort};
use sqlx::SqliteConnection;

use crate::error::is_unique_violation;
use crate::models::{PullRequestRow, PullRequestShortRow};
use crate::Result;

/// Pull request queries bound to one connection or transaction
pub struct PullRequestRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> PullRequestRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Take the database write lock on behalf of `pull_request_id`.
    ///
    /// SQLite locks the whole file, so a no-op write is enough to serialize
    /// every transaction that touches the same id. It must run before any
    /// read in the transaction, or a concurrent writer can invalidate the
    /// snapshot and fail the later upgrade.
    pub async fn lock(&mut self, pull_request_id: &str) -> Result<()> {
        sqlx::query("UPDATE pull_requests SET status = status WHERE pull_request_id = ?")
            .bind(pull_request_id)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    pub async fn find(&mut self, pull_request_id: &str) -> Result<Option<PullRequestRecord>> {
        let row = sqlx::query_as::<_, PullRequestRow>(
            r#"
            SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
            FROM pull_requests
            WHERE pull_request_id = ?
            "#,
        )
        .bind(pull_request_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        row.map(PullRequestRecord::try_from).transpose()
    }

    /// Insert a pull request, returning `false` if the id is already taken
    pub async fn insert(&mut self, record: &PullRequestRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO pull_requests
                (pull_request_id, pull_request_name, author_id, status, created_at, merged_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.pull_request_id)
        .bind(&record.name)
        .bind(&record.author_id)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.merged_at)
        .execute(&mut *self.conn)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Move an open pull request to `MERGED`; returns whether a row changed
    pub async fn mark_merged(
        &mut self,
        pull_request_id: &str,
        merged_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE pull_requests SET status = 'MERGED', merged_at = ?
             WHERE pull_request_id = ? AND status = 'OPEN'",
        )
        .bind(merged_at)
        .bind(pull_request_id)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Pull requests where `user_id` currently holds a slot, newest first
    pub async fn find_by_reviewer(&mut self, user_id: &str) -> Result<Vec<PullRequestShort>> {
        let rows = sqlx::query_as::<_, PullRequestShortRow>(
            r#"
            SELECT p.pull_request_id, p.pull_request_name, p.author_id, p.status
            FROM pull_requests p
            JOIN pr_reviewers r ON r.pr_id = p.pull_request_id
            WHERE r.reviewer_id = ?
            ORDER BY p.created_at DESC, p.pull_request_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(PullRequestShort::try_from).collect()
    }
}
