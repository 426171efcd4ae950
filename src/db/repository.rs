//! Repository traits for data access abstraction.
//!
//! These traits define the contract for data access, allowing different
//! storage backends to be swapped without changing business logic.

use std::future::Future;

use crate::db::{
    DbResult,
    models::{
        CommitOutcome, Id, Item, ItemChangeSet, ItemQuery, ListResult, NewItem, NewUser,
        PasswordDigest, Share, ShareChangeSet, Tag, User, UserQuery, UserRole, VersionToken,
    },
};

/// Repository for User operations.
pub trait UserRepository {
    /// Create a new user. Fails with `AlreadyExists` when the email is taken.
    fn create(&self, user: &NewUser) -> impl Future<Output = DbResult<User>> + Send;

    /// Get a user by ID.
    fn get(&self, id: Id) -> impl Future<Output = DbResult<User>> + Send;

    /// Find a user by email.
    fn find_by_email(&self, email: &str) -> impl Future<Output = DbResult<Option<User>>> + Send;

    /// Find a user and their stored password digest by email.
    fn credentials(
        &self,
        email: &str,
    ) -> impl Future<Output = DbResult<Option<(User, PasswordDigest)>>> + Send;

    /// List users matching the query, ordered by id.
    fn list(&self, query: &UserQuery) -> impl Future<Output = DbResult<Vec<User>>> + Send;

    /// Check whether a user exists.
    fn exists(&self, id: Id) -> impl Future<Output = DbResult<bool>> + Send;

    /// Change a user's role if their version still matches `expected`.
    fn update_role(
        &self,
        id: Id,
        role: UserRole,
        expected: &VersionToken,
    ) -> impl Future<Output = DbResult<CommitOutcome>> + Send;
}

/// Repository for bearer sessions.
pub trait SessionRepository {
    /// Store a session token for a user.
    fn create(&self, token: &str, user_id: Id) -> impl Future<Output = DbResult<()>> + Send;

    /// Resolve a session token to its user.
    fn user_for(&self, token: &str) -> impl Future<Output = DbResult<Option<User>>> + Send;

    /// Remove a session token.
    fn delete(&self, token: &str) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for to-do item operations.
pub trait ItemRepository {
    /// Create a new item with a fresh version token.
    fn create(&self, item: &NewItem) -> impl Future<Output = DbResult<Item>> + Send;

    /// Get an item (with tag names) by ID.
    fn get(&self, id: Id) -> impl Future<Output = DbResult<Item>> + Send;

    /// Check whether an item exists.
    fn exists(&self, id: Id) -> impl Future<Output = DbResult<bool>> + Send;

    /// List items with filtering, sorting and pagination.
    fn list(&self, query: &ItemQuery) -> impl Future<Output = DbResult<ListResult<Item>>> + Send;

    /// Get the tag rows of an item.
    fn tags(&self, item_id: Id) -> impl Future<Output = DbResult<Vec<Tag>>> + Send;

    /// Get the share rows of an item.
    fn shares(&self, item_id: Id) -> impl Future<Output = DbResult<Vec<Share>>> + Send;

    /// Apply field and tag changes atomically, version-checking the field write.
    fn apply(&self, change: &ItemChangeSet)
    -> impl Future<Output = DbResult<CommitOutcome>> + Send;

    /// Apply share changes atomically.
    fn apply_shares(&self, change: &ShareChangeSet) -> impl Future<Output = DbResult<()>> + Send;

    /// Delete an item together with its tags and shares.
    fn delete(&self, id: Id) -> impl Future<Output = DbResult<()>> + Send;
}

/// Combined database interface.
pub trait Database: Send + Sync {
    type Users<'a>: UserRepository + Send + Sync
    where
        Self: 'a;
    type Sessions<'a>: SessionRepository + Send + Sync
    where
        Self: 'a;
    type Items<'a>: ItemRepository + Send + Sync
    where
        Self: 'a;

    /// Run pending migrations.
    fn migrate(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Get the user repository.
    fn users(&self) -> Self::Users<'_>;

    /// Get the session repository.
    fn sessions(&self) -> Self::Sessions<'_>;

    /// Get the item repository.
    fn items(&self) -> Self::Items<'_>;
}
