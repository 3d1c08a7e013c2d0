//! Repository for team records

use sqlx::SqliteConnection;

use crate::error::is_unique_violation;
use crate::Result;

/// Team queries bound to one connection or transaction
pub struct TeamRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> TeamRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Insert a team, returning `false` if the name is already taken
    pub async fn insert(&mut self, team_name: &str) -> Result<bool> {
        let result = sqlx::query("INSERT INTO teams (team_name) VALUES (?)")
            .bind(team_name)
            .execute(&mut *self.conn)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&mut self, team_name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams WHERE team_name = ?")
            .bind(team_name)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count > 0)
    }
}
