//! Accounts, sessions and user administration.

use std::sync::Arc;

use tracing::{info, instrument};

use super::credentials::{
    digest_password, is_strong_password, is_valid_email, new_session_token, verify_password,
};
use super::error::{ServiceError, ServiceResult};
use super::messages;
use crate::db::{
    CommitOutcome, Database, DbError, Id, NewUser, SessionRepository, User, UserQuery,
    UserRepository, UserRole, VersionToken,
};

/// Registration input.
#[derive(Clone)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// A logged-in session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Account and session operations over any [`Database`].
pub struct UserService<D: Database> {
    db: Arc<D>,
}

impl<D: Database> Clone for UserService<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

impl<D: Database> UserService<D> {
    pub fn new(db: Arc<D>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn register(&self, request: RegisterUser) -> ServiceResult<User> {
        if request.username.trim().is_empty() {
            return Err(ServiceError::Validation(
                messages::USERNAME_REQUIRED.to_string(),
            ));
        }
        if !is_valid_email(&request.email) {
            return Err(ServiceError::Validation(messages::INVALID_EMAIL.to_string()));
        }
        if !is_strong_password(&request.password) {
            return Err(ServiceError::Validation(messages::WEAK_PASSWORD.to_string()));
        }

        let new_user = NewUser {
            username: request.username,
            email: request.email,
            password: digest_password(&request.password),
        };

        match self.db.users().create(&new_user).await {
            Ok(user) => Ok(user),
            Err(DbError::AlreadyExists { .. }) => Err(ServiceError::Validation(
                messages::USER_ALREADY_EXISTS.to_string(),
            )),
            Err(e) => Err(ServiceError::unexpected(messages::REGISTER_FAILED, e)),
        }
    }

    /// Check credentials and open a session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<Session> {
        let (user, digest) = self
            .db
            .users()
            .credentials(email)
            .await
            .map_err(|e| ServiceError::unexpected(messages::LOGIN_FAILED, e))?
            .ok_or_else(|| ServiceError::NotFound(messages::USER_NOT_FOUND.to_string()))?;

        if !verify_password(password, &digest) {
            return Err(ServiceError::Unauthenticated(
                messages::LOGIN_FAILED.to_string(),
            ));
        }

        let token = new_session_token();
        self.db
            .sessions()
            .create(&token, user.id)
            .await
            .map_err(|e| ServiceError::unexpected(messages::LOGIN_FAILED, e))?;

        Ok(Session { token, user })
    }

    #[instrument(skip_all)]
    pub async fn logout(&self, token: &str) -> ServiceResult<()> {
        self.db
            .sessions()
            .delete(token)
            .await
            .map_err(|e| ServiceError::unexpected(messages::LOGOUT_FAILED, e))
    }

    /// Resolve a bearer token to its user.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, token: &str) -> ServiceResult<User> {
        self.db
            .sessions()
            .user_for(token)
            .await
            .map_err(|e| ServiceError::unexpected(messages::NOT_AUTHENTICATED, e))?
            .ok_or_else(|| ServiceError::Unauthenticated(messages::NOT_AUTHENTICATED.to_string()))
    }

    /// All non-admin users. Admin only.
    #[instrument(skip(self, caller), fields(caller = caller.id))]
    pub async fn list(&self, caller: &User) -> ServiceResult<Vec<User>> {
        ensure_admin(caller)?;

        let query = UserQuery {
            exclude_role: Some(UserRole::Admin),
            exclude_id: None,
        };
        self.db
            .users()
            .list(&query)
            .await
            .map_err(|e| ServiceError::unexpected(messages::GET_USERS_FAILED, e))
    }

    /// One non-admin user. Admin only.
    #[instrument(skip(self, caller), fields(caller = caller.id))]
    pub async fn get(&self, caller: &User, id: Id) -> ServiceResult<User> {
        ensure_admin(caller)?;

        let user = self.db.users().get(id).await.map_err(|e| {
            ServiceError::lookup(e, messages::USER_NOT_FOUND, messages::GET_USER_FAILED)
        })?;

        if user.role == UserRole::Admin {
            return Err(ServiceError::NotFound(messages::USER_NOT_FOUND.to_string()));
        }
        Ok(user)
    }

    /// Set a user's role, guarded by the version the caller last read. Admin only.
    #[instrument(skip(self, caller), fields(caller = caller.id))]
    pub async fn change_role(
        &self,
        caller: &User,
        id: Id,
        role: &str,
        version: VersionToken,
    ) -> ServiceResult<VersionToken> {
        ensure_admin(caller)?;
        let role: UserRole = role
            .parse()
            .map_err(|_| ServiceError::Validation(messages::ROLE_NOT_FOUND.to_string()))?;

        let users = self.db.users();
        let user = users.get(id).await.map_err(|e| {
            ServiceError::lookup(e, messages::USER_NOT_FOUND, messages::CHANGE_ROLE_FAILED)
        })?;

        if user.role == role {
            return Err(ServiceError::NoOp(messages::ROLE_IS_SAME.to_string()));
        }

        match users.update_role(id, role, &version).await {
            Ok(CommitOutcome::Committed { version }) => Ok(version.unwrap_or(user.version)),
            Ok(CommitOutcome::Conflict) => match users.exists(id).await {
                Ok(true) => Err(ServiceError::Conflict(
                    messages::USER_UPDATED_BY_OTHERS.to_string(),
                )),
                Ok(false) => Err(ServiceError::NotFound(messages::USER_NOT_FOUND.to_string())),
                Err(e) => Err(ServiceError::unexpected(messages::CHANGE_ROLE_FAILED, e)),
            },
            Err(e) => Err(ServiceError::unexpected(messages::CHANGE_ROLE_FAILED, e)),
        }
    }

    /// Make the registered user with `email` an admin. Used at start-up.
    #[instrument(skip(self))]
    pub async fn promote_admin(&self, email: &str) -> ServiceResult<User> {
        let users = self.db.users();
        let user = users
            .find_by_email(email)
            .await
            .map_err(|e| ServiceError::unexpected(messages::CHANGE_ROLE_FAILED, e))?
            .ok_or_else(|| ServiceError::NotFound(messages::USER_NOT_FOUND.to_string()))?;

        if user.role == UserRole::Admin {
            return Ok(user);
        }

        match users.update_role(user.id, UserRole::Admin, &user.version).await {
            Ok(CommitOutcome::Committed { .. }) => {
                info!(user_id = user.id, "Promoted user to admin");
                users.get(user.id).await.map_err(|e| {
                    ServiceError::lookup(e, messages::USER_NOT_FOUND, messages::CHANGE_ROLE_FAILED)
                })
            }
            Ok(CommitOutcome::Conflict) => Err(ServiceError::Conflict(
                messages::USER_UPDATED_BY_OTHERS.to_string(),
            )),
            Err(e) => Err(ServiceError::unexpected(messages::CHANGE_ROLE_FAILED, e)),
        }
    }
}

fn ensure_admin(caller: &User) -> ServiceResult<()> {
    if caller.role == UserRole::Admin {
        Ok(())
    } else {
        Err(ServiceError::Authorization(messages::ADMIN_ONLY.to_string()))
    }
}
