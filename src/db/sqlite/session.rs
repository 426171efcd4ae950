//! SQLite SessionRepository implementation.

use sqlx::SqlitePool;

use super::user::row_to_user;
use crate::db::utils::current_timestamp;
use crate::db::{DbResult, Id, SessionRepository, User};

/// SQLx-backed session repository.
pub struct SqliteSessionRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> SessionRepository for SqliteSessionRepository<'a> {
    async fn create(&self, token: &str, user_id: Id) -> DbResult<()> {
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(user_id)
            .bind(current_timestamp())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    async fn user_for(&self, token: &str) -> DbResult<Option<User>> {
        let row = sqlx::query(
            "SELECT u.id, u.username, u.email, u.role, u.version
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token = ?",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn delete(&self, token: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
