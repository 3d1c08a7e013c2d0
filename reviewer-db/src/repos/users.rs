//! Repository for user records

use reviewer_core::model::User;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::models::UserRow;
use crate::Result;

/// User queries bound to one connection or transaction
pub struct UserRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> UserRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Insert a user or overwrite name, activity and team of an existing one
    pub async fn upsert(&mut self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, is_active, team_name)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                is_active = excluded.is_active,
                team_name = excluded.team_name
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.username)
        .bind(user.is_active)
        .bind(&user.team_name)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn find(&mut self, user_id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, username, team_name, is_active FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(User::from))
    }

    /// Members of a team ordered by id
    pub async fn find_by_team(&mut self, team_name: &str) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, username, team_name, is_active FROM users
             WHERE team_name = ?
             ORDER BY user_id",
        )
        .bind(team_name)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Returns `false` if no such user exists
    pub async fn set_active(&mut self, user_id: &str, is_active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE user_id = ?")
            .bind(is_active)
            .bind(user_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Active members of `team_name` whose id is not in `exclude`
    pub async fn find_eligible(&mut self, team_name: &str, exclude: &[&str]) -> Result<Vec<String>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT user_id FROM users WHERE is_active = 1 AND team_name = ");
        query.push_bind(team_name.to_string());

        if !exclude.is_empty() {
            query.push(" AND user_id NOT IN (");
            let mut ids = query.separated(", ");
            for id in exclude {
                ids.push_bind(id.to_string());
            }
            ids.push_unseparated(")");
        }

        let ids = query
            .build_query_scalar::<String>()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(ids)
    }
}
