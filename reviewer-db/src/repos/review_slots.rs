//! Repository for positional reviewer slots

use reviewer_core::model::{AssignmentCount, ReviewSlot};
use sqlx::SqliteConnection;

use crate::models::{AssignmentCountRow, ReviewSlotRow};
use crate::Result;

/// Review slot queries bound to one connection or transaction
pub struct ReviewSlotRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ReviewSlotRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Slots of a pull request ordered by position
    pub async fn find_by_pull_request(&mut self, pull_request_id: &str) -> Result<Vec<ReviewSlot>> {
        let rows = sqlx::query_as::<_, ReviewSlotRow>(
            "SELECT pr_id, position, reviewer_id FROM pr_reviewers
             WHERE pr_id = ?
             ORDER BY position",
        )
        .bind(pull_request_id)
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(ReviewSlot::try_from).collect()
    }

    pub async fn insert(&mut self, slot: &ReviewSlot) -> Result<()> {
        sqlx::query("INSERT INTO pr_reviewers (pr_id, position, reviewer_id) VALUES (?, ?, ?)")
            .bind(&slot.pull_request_id)
            .bind(i64::from(slot.position))
            .bind(&slot.reviewer_id)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    /// Put `reviewer_id` into an existing slot; returns `false` if there is none
    pub async fn update_reviewer(
        &mut self,
        pull_request_id: &str,
        position: u8,
        reviewer_id: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE pr_reviewers SET reviewer_id = ? WHERE pr_id = ? AND position = ?",
        )
        .bind(reviewer_id)
        .bind(pull_request_id)
        .bind(i64::from(position))
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Slot counts per reviewer, highest first
    pub async fn count_by_reviewer(&mut self) -> Result<Vec<AssignmentCount>> {
        let rows = sqlx::query_as::<_, AssignmentCountRow>(
            r#"
            SELECT reviewer_id AS user_id, COUNT(*) AS count
            FROM pr_reviewers
            GROUP BY reviewer_id
            ORDER BY count DESC, reviewer_id
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(AssignmentCount::from).collect())
    }
}
