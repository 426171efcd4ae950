//! SQLite UserRepository implementation.

use std::str::FromStr;

use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::db::{
    CommitOutcome, DbError, DbResult, Id, NewUser, PasswordDigest, User, UserQuery,
    UserRepository, UserRole, VersionToken,
};

/// SQLx-backed user repository.
pub struct SqliteUserRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

const USER_COLUMNS: &str = "id, username, email, role, version";

impl<'a> UserRepository for SqliteUserRepository<'a> {
    async fn create(&self, user: &NewUser) -> DbResult<User> {
        let version = VersionToken::generate();
        let role = UserRole::User;

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, password_salt, role, version)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password.hash)
        .bind(&user.password.salt)
        .bind(role.to_string())
        .bind(version.as_bytes())
        .execute(self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::AlreadyExists { .. } => DbError::AlreadyExists {
                entity_type: "User".to_string(),
                id: user.email.clone(),
            },
            other => other,
        })?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username.clone(),
            email: user.email.clone(),
            role,
            version,
        })
    }

    async fn get(&self, id: Id) -> DbResult<User> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        let row = row.ok_or(DbError::NotFound {
            entity_type: "User".to_string(),
            id: id.to_string(),
        })?;

        row_to_user(&row)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn credentials(&self, email: &str) -> DbResult<Option<(User, PasswordDigest)>> {
        let row = sqlx::query(&format!(
            "SELECT {}, password_hash, password_salt FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let digest = PasswordDigest {
            hash: row.get("password_hash"),
            salt: row.get("password_salt"),
        };
        Ok(Some((row_to_user(&row)?, digest)))
    }

    async fn list(&self, query: &UserQuery) -> DbResult<Vec<User>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM users WHERE 1 = 1", USER_COLUMNS));

        if let Some(role) = query.exclude_role {
            builder.push(" AND role != ").push_bind(role.to_string());
        }
        if let Some(id) = query.exclude_id {
            builder.push(" AND id != ").push_bind(id);
        }
        builder.push(" ORDER BY id ASC");

        let rows = builder.build().fetch_all(self.pool).await?;
        rows.iter().map(row_to_user).collect()
    }

    async fn exists(&self, id: Id) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    async fn update_role(
        &self,
        id: Id,
        role: UserRole,
        expected: &VersionToken,
    ) -> DbResult<CommitOutcome> {
        let next = VersionToken::generate();

        let result =
            sqlx::query("UPDATE users SET role = ?, version = ? WHERE id = ? AND version = ?")
                .bind(role.to_string())
                .bind(next.as_bytes())
                .bind(id)
                .bind(expected.as_bytes())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(CommitOutcome::Conflict);
        }

        Ok(CommitOutcome::Committed {
            version: Some(next),
        })
    }
}

/// Convert a database row to a User model.
pub(crate) fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> DbResult<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str).map_err(|message| DbError::InvalidData {
        message,
        help: "Roles are stored as 'User' or 'Admin'".to_string(),
    })?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        role,
        version: VersionToken::from_bytes(row.get("version")),
    })
}
