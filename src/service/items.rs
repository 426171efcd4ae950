//! To-do item operations.
//!
//! Every operation here takes the already-authenticated caller and returns a
//! typed result. The update path is the interesting one:
//!
//! 1. validate status and priority (no store access yet)
//! 2. load the item and its shares, then authorize
//! 3. diff scalar fields and reconcile tags; nothing changed is a no-op
//! 4. commit fields (version-checked) and tag changes in one transaction
//! 5. on a version mismatch, tell "deleted meanwhile" apart from "changed meanwhile"

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::access::{Operation, authorize};
use super::error::{ServiceError, ServiceResult};
use super::messages;
use super::reconcile::{reconcile_shares, reconcile_tags};
use crate::db::utils::storage_precision;
use crate::db::{
    CommitOutcome, Database, FieldUpdate, Id, Item, ItemChangeSet, ItemFields, ItemFilter,
    ItemPriority, ItemQuery, ItemRepository, ItemStatus, ListResult, NewItem, PageSort,
    ShareChangeSet, User, UserQuery, UserRepository, VersionToken,
};

/// Values for a new item. Status is not accepted: new items start NotStarted.
#[derive(Debug, Clone)]
pub struct CreateItem {
    pub name: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: String,
}

/// Full replacement of an item's fields and tags.
#[derive(Debug, Clone)]
pub struct UpdateItem {
    pub name: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: String,
    pub priority: String,
    pub tags: Vec<String>,
    /// Version the caller last read. Only required once something will be written.
    pub version: Option<VersionToken>,
}

/// Listing filters as supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct ListItems {
    pub name: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tag: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: PageSort,
}

/// A user an item could be shared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableUser {
    pub id: Id,
    pub username: String,
}

fn parse_status(raw: &str) -> ServiceResult<ItemStatus> {
    raw.parse()
        .map_err(|_| ServiceError::Validation(messages::INVALID_STATUS.to_string()))
}

fn parse_priority(raw: &str) -> ServiceResult<ItemPriority> {
    raw.parse()
        .map_err(|_| ServiceError::Validation(messages::INVALID_PRIORITY.to_string()))
}

/// SQLite takes LIMIT and OFFSET as signed 64-bit integers.
fn check_page(page: &PageSort) -> ServiceResult<()> {
    let fits = |value: Option<usize>| value.is_none_or(|v| i64::try_from(v).is_ok());
    if fits(page.limit) && fits(page.offset) {
        Ok(())
    } else {
        Err(ServiceError::Validation(messages::INVALID_PAGE.to_string()))
    }
}

/// Item operations over any [`Database`].
pub struct ItemService<D: Database> {
    db: Arc<D>,
}

impl<D: Database> Clone for ItemService<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

impl<D: Database> ItemService<D> {
    pub fn new(db: Arc<D>) -> Self {
        Self { db }
    }

    /// Create an item owned by `caller`.
    #[instrument(skip(self, caller), fields(caller = caller.id))]
    pub async fn create(&self, caller: &User, request: CreateItem) -> ServiceResult<Item> {
        let priority = parse_priority(&request.priority)?;

        let new_item = NewItem {
            owner_id: caller.id,
            name: request.name,
            description: request.description,
            due_date: storage_precision(request.due_date),
            priority,
        };

        self.db
            .items()
            .create(&new_item)
            .await
            .map_err(|e| ServiceError::unexpected(messages::CREATE_ITEM_FAILED, e))
    }

    /// Fetch one item the caller owns or has been shared.
    #[instrument(skip(self, caller), fields(caller = caller.id))]
    pub async fn get(&self, caller: &User, id: Id) -> ServiceResult<Item> {
        let items = self.db.items();

        let item = items.get(id).await.map_err(|e| {
            ServiceError::lookup(e, messages::ITEM_NOT_FOUND, messages::GET_ITEM_FAILED)
        })?;
        let shares = items
            .shares(id)
            .await
            .map_err(|e| ServiceError::unexpected(messages::GET_ITEM_FAILED, e))?;

        authorize(caller, &item, &shares, Operation::View)?;
        Ok(item)
    }

    /// Items the caller owns or has been shared, filtered, sorted and paged.
    #[instrument(skip(self, caller), fields(caller = caller.id))]
    pub async fn list(&self, caller: &User, request: ListItems) -> ServiceResult<ListResult<Item>> {
        let status = request.status.as_deref().map(parse_status).transpose()?;
        let priority = request.priority.as_deref().map(parse_priority).transpose()?;
        check_page(&request.page)?;

        let query = ItemQuery {
            page: request.page,
            filter: ItemFilter {
                name: request.name,
                status,
                priority,
                tag: request.tag,
                start_date: request.start_date,
                end_date: request.end_date,
            },
            visible_to: Some(caller.id),
        };

        self.db
            .items()
            .list(&query)
            .await
            .map_err(|e| ServiceError::unexpected(messages::GET_ITEMS_FAILED, e))
    }

    /// Replace an item's fields and tags, guarded by the caller's version.
    ///
    /// Returns the item's version after the commit. A tags-only change keeps
    /// the current version.
    #[instrument(skip(self, caller, request), fields(caller = caller.id))]
    pub async fn update(
        &self,
        caller: &User,
        id: Id,
        request: UpdateItem,
    ) -> ServiceResult<VersionToken> {
        let status = parse_status(&request.status)?;
        let priority = parse_priority(&request.priority)?;
        let fields = ItemFields {
            name: request.name,
            description: request.description,
            due_date: storage_precision(request.due_date),
            status,
            priority,
        };

        let items = self.db.items();

        let item = items.get(id).await.map_err(|e| {
            ServiceError::lookup(e, messages::ITEM_NOT_EXIST, messages::UPDATE_ITEM_FAILED)
        })?;
        let shares = items
            .shares(id)
            .await
            .map_err(|e| ServiceError::unexpected(messages::UPDATE_ITEM_FAILED, e))?;

        authorize(caller, &item, &shares, Operation::Update)?;

        let tags = items
            .tags(id)
            .await
            .map_err(|e| ServiceError::unexpected(messages::UPDATE_ITEM_FAILED, e))?;
        let tag_diff = reconcile_tags(&tags, &request.tags);
        let fields_changed = fields != item.fields();

        // Checked before the version is ever compared
        if !fields_changed && tag_diff.is_empty() {
            return Err(ServiceError::NoOp(messages::ITEM_AND_TAGS_SAME.to_string()));
        }

        let expected_version = request
            .version
            .ok_or_else(|| ServiceError::Validation(messages::INVALID_VERSION.to_string()))?;

        debug!(
            fields_changed,
            insert_tags = tag_diff.insert.len(),
            delete_tags = tag_diff.delete.len(),
            "Committing item change set"
        );

        let change = ItemChangeSet {
            item_id: id,
            fields: fields_changed.then(|| FieldUpdate {
                fields,
                expected_version,
            }),
            insert_tags: tag_diff.insert,
            delete_tag_ids: tag_diff.delete.iter().map(|tag| tag.id).collect(),
        };

        match items.apply(&change).await {
            Ok(CommitOutcome::Committed { version }) => Ok(version.unwrap_or(item.version)),
            Ok(CommitOutcome::Conflict) => Err(self.explain_conflict(id).await),
            Err(e) => Err(ServiceError::unexpected(messages::UPDATE_ITEM_FAILED, e)),
        }
    }

    /// A rejected compare-and-swap: the item is either gone or changed.
    async fn explain_conflict(&self, id: Id) -> ServiceError {
        match self.db.items().exists(id).await {
            Ok(true) => ServiceError::Conflict(messages::ITEM_UPDATED_BY_OTHERS.to_string()),
            Ok(false) => ServiceError::NotFound(messages::ITEM_NOT_FOUND.to_string()),
            Err(e) => ServiceError::unexpected(messages::UPDATE_ITEM_FAILED, e),
        }
    }

    /// Delete an item with its tags and shares. Owner only.
    #[instrument(skip(self, caller), fields(caller = caller.id))]
    pub async fn delete(&self, caller: &User, id: Id) -> ServiceResult<()> {
        let items = self.db.items();

        let item = items.get(id).await.map_err(|e| {
            ServiceError::lookup(e, messages::ITEM_NOT_FOUND, messages::DELETE_ITEM_FAILED)
        })?;

        authorize(caller, &item, &[], Operation::Delete)?;

        items.delete(id).await.map_err(|e| {
            ServiceError::lookup(e, messages::ITEM_NOT_FOUND, messages::DELETE_ITEM_FAILED)
        })
    }

    /// Make `user_ids` exactly the set of users the item is shared with. Owner only.
    #[instrument(skip(self, caller), fields(caller = caller.id))]
    pub async fn share(&self, caller: &User, id: Id, user_ids: &[Id]) -> ServiceResult<()> {
        let items = self.db.items();

        let item = items.get(id).await.map_err(|e| {
            ServiceError::lookup(e, messages::ITEM_NOT_FOUND, messages::SHARE_ITEM_FAILED)
        })?;
        let shares = items
            .shares(id)
            .await
            .map_err(|e| ServiceError::unexpected(messages::SHARE_ITEM_FAILED, e))?;

        authorize(caller, &item, &shares, Operation::Share)?;

        let diff = reconcile_shares(item.owner_id, &shares, user_ids);
        if diff.is_empty() {
            return Err(ServiceError::NoOp(messages::USERS_TO_SHARE_SAME.to_string()));
        }

        // Users already on the list exist by foreign key; only newcomers need checking
        let users = self.db.users();
        for user_id in &diff.insert {
            let exists = users
                .exists(*user_id)
                .await
                .map_err(|e| ServiceError::unexpected(messages::SHARE_ITEM_FAILED, e))?;
            if !exists {
                return Err(ServiceError::NotFound(messages::USER_NOT_FOUND.to_string()));
            }
        }

        let change = ShareChangeSet {
            item_id: id,
            insert_user_ids: diff.insert,
            delete_share_ids: diff.delete.iter().map(|share| share.id).collect(),
        };

        items
            .apply_shares(&change)
            .await
            .map_err(|e| ServiceError::unexpected(messages::SHARE_ITEM_FAILED, e))
    }

    /// Every user except the item's owner.
    #[instrument(skip(self))]
    pub async fn available_users(&self, item_id: Id) -> ServiceResult<Vec<AvailableUser>> {
        let item = self.db.items().get(item_id).await.map_err(|e| {
            ServiceError::lookup(
                e,
                messages::ITEM_NOT_FOUND_FOR_SHARING,
                messages::AVAILABLE_USERS_FAILED,
            )
        })?;

        let query = UserQuery {
            exclude_role: None,
            exclude_id: Some(item.owner_id),
        };
        let users = self
            .db
            .users()
            .list(&query)
            .await
            .map_err(|e| ServiceError::unexpected(messages::AVAILABLE_USERS_FAILED, e))?;

        Ok(users
            .into_iter()
            .map(|user| AvailableUser {
                id: user.id,
                username: user.username,
            })
            .collect())
    }
}
