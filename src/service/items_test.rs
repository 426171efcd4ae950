//! Tests for ItemService.
//!
//! `WatchedDatabase` wraps the in-memory SQLite store. It counts item
//! repository calls and can let a second writer touch or delete the item
//! right before a change set is committed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};

use super::messages;
use super::{
    CreateItem, ItemService, ListItems, RegisterUser, ServiceError, UpdateItem, UserService,
};
use crate::db::sqlite::{SqliteItemRepository, SqliteSessionRepository, SqliteUserRepository};
use crate::db::{
    CommitOutcome, Database, DbResult, FieldUpdate, Id, Item, ItemChangeSet, ItemQuery,
    ItemRepository, ItemStatus, ListResult, NewItem, PageSort, Share, ShareChangeSet,
    SqliteDatabase, Tag, User, VersionToken,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Race {
    Quiet,
    /// Another writer updates the item just before the commit.
    Touch,
    /// Another writer deletes the item just before the commit.
    Delete,
}

struct WatchedDatabase {
    inner: SqliteDatabase,
    race: Race,
    calls: AtomicUsize,
}

struct WatchedItems<'a> {
    inner: SqliteItemRepository<'a>,
    store: &'a WatchedDatabase,
}

impl WatchedItems<'_> {
    fn count(&self) {
        self.store.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl ItemRepository for WatchedItems<'_> {
    async fn create(&self, item: &NewItem) -> DbResult<Item> {
        self.count();
        self.inner.create(item).await
    }

    async fn get(&self, id: Id) -> DbResult<Item> {
        self.count();
        self.inner.get(id).await
    }

    async fn exists(&self, id: Id) -> DbResult<bool> {
        self.count();
        self.inner.exists(id).await
    }

    async fn list(&self, query: &ItemQuery) -> DbResult<ListResult<Item>> {
        self.count();
        self.inner.list(query).await
    }

    async fn tags(&self, item_id: Id) -> DbResult<Vec<Tag>> {
        self.count();
        self.inner.tags(item_id).await
    }

    async fn shares(&self, item_id: Id) -> DbResult<Vec<Share>> {
        self.count();
        self.inner.shares(item_id).await
    }

    async fn apply(&self, change: &ItemChangeSet) -> DbResult<CommitOutcome> {
        self.count();
        match self.store.race {
            Race::Quiet => {}
            Race::Touch => {
                let current = self.inner.get(change.item_id).await?;
                let mut fields = current.fields();
                fields.description.push_str(" (edited elsewhere)");
                self.inner
                    .apply(&ItemChangeSet {
                        item_id: change.item_id,
                        fields: Some(FieldUpdate {
                            fields,
                            expected_version: current.version,
                        }),
                        insert_tags: vec![],
                        delete_tag_ids: vec![],
                    })
                    .await?;
            }
            Race::Delete => self.inner.delete(change.item_id).await?,
        }
        self.inner.apply(change).await
    }

    async fn apply_shares(&self, change: &ShareChangeSet) -> DbResult<()> {
        self.count();
        self.inner.apply_shares(change).await
    }

    async fn delete(&self, id: Id) -> DbResult<()> {
        self.count();
        self.inner.delete(id).await
    }
}

impl Database for WatchedDatabase {
    type Users<'a> = SqliteUserRepository<'a>;
    type Sessions<'a> = SqliteSessionRepository<'a>;
    type Items<'a> = WatchedItems<'a>;

    async fn migrate(&self) -> DbResult<()> {
        self.inner.migrate().await
    }

    fn users(&self) -> Self::Users<'_> {
        self.inner.users()
    }

    fn sessions(&self) -> Self::Sessions<'_> {
        self.inner.sessions()
    }

    fn items(&self) -> Self::Items<'_> {
        WatchedItems {
            inner: self.inner.items(),
            store: self,
        }
    }
}

struct Fixture {
    db: Arc<WatchedDatabase>,
    items: ItemService<WatchedDatabase>,
    ann: User,
    bob: User,
    cat: User,
}

impl Fixture {
    fn calls(&self) -> usize {
        self.db.calls.load(Ordering::SeqCst)
    }
}

async fn setup(race: Race) -> Fixture {
    let inner = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create in-memory database");
    let db = Arc::new(WatchedDatabase {
        inner,
        race,
        calls: AtomicUsize::new(0),
    });
    db.migrate().await.expect("Migration should succeed");

    let users = UserService::new(Arc::clone(&db));
    let mut registered = Vec::new();
    for name in ["ann", "bob", "cat"] {
        let user = users
            .register(RegisterUser {
                username: name.to_string(),
                email: format!("{}@example.com", name),
                password: "Passw0rd!".to_string(),
            })
            .await
            .expect("Register should succeed");
        registered.push(user);
    }
    let cat = registered.pop().unwrap();
    let bob = registered.pop().unwrap();
    let ann = registered.pop().unwrap();

    Fixture {
        items: ItemService::new(Arc::clone(&db)),
        db,
        ann,
        bob,
        cat,
    }
}

fn due() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Item{name:"Test1", NotStarted, Low, tags:["Test1"]} owned by ann.
async fn seed_item(fx: &Fixture) -> Item {
    let item = fx
        .items
        .create(
            &fx.ann,
            CreateItem {
                name: "Test1".to_string(),
                description: "First item".to_string(),
                due_date: due(),
                priority: "Low".to_string(),
            },
        )
        .await
        .expect("Create should succeed");

    let version = fx
        .items
        .update(&fx.ann, item.id, update_from(&item, strings(&["Test1"])))
        .await
        .expect("Tagging should succeed");
    assert_eq!(version, item.version);

    fx.items.get(&fx.ann, item.id).await.unwrap()
}

fn update_from(item: &Item, tags: Vec<String>) -> UpdateItem {
    UpdateItem {
        name: item.name.clone(),
        description: item.description.clone(),
        due_date: item.due_date,
        status: item.status.to_string(),
        priority: item.priority.to_string(),
        tags,
        version: Some(item.version.clone()),
    }
}

// =============================================================================
// Create / get / list / delete
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn create_starts_not_started_with_fresh_version() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    assert_eq!(item.status, ItemStatus::NotStarted);
    assert_eq!(item.owner_id, fx.ann.id);
    assert_eq!(item.tags, vec!["Test1"]);
    assert_eq!(item.version.as_bytes().len(), 16);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_rejects_unknown_priority() {
    let fx = setup(Race::Quiet).await;

    let result = fx
        .items
        .create(
            &fx.ann,
            CreateItem {
                name: "Bad".to_string(),
                description: String::new(),
                due_date: due(),
                priority: "Urgent".to_string(),
            },
        )
        .await;

    assert_eq!(
        result.unwrap_err(),
        ServiceError::Validation(messages::INVALID_PRIORITY.to_string())
    );
    assert_eq!(fx.calls(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn get_by_stranger_is_authorization_error() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    let err = fx.items.get(&fx.cat, item.id).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Authorization(messages::CANNOT_ACCESS.to_string())
    );

    let missing = fx.items.get(&fx.ann, 9999).await.unwrap_err();
    assert_eq!(
        missing,
        ServiceError::NotFound(messages::ITEM_NOT_FOUND.to_string())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn list_shows_owned_and_shared_items() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    let for_bob = fx.items.list(&fx.bob, ListItems::default()).await.unwrap();
    assert_eq!(for_bob.total, 0);

    fx.items.share(&fx.ann, item.id, &[fx.bob.id]).await.unwrap();

    let for_bob = fx.items.list(&fx.bob, ListItems::default()).await.unwrap();
    assert_eq!(for_bob.items.len(), 1);
    assert_eq!(for_bob.items[0].owner_username, "ann");
}

#[tokio::test(flavor = "multi_thread")]
async fn list_rejects_unknown_status_filter() {
    let fx = setup(Race::Quiet).await;

    let result = fx
        .items
        .list(
            &fx.ann,
            ListItems {
                status: Some("Done".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert_eq!(
        result.unwrap_err(),
        ServiceError::Validation(messages::INVALID_STATUS.to_string())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn list_rejects_paging_beyond_sqlite_integers() {
    let fx = setup(Race::Quiet).await;
    seed_item(&fx).await;
    let expected = ServiceError::Validation(messages::INVALID_PAGE.to_string());

    for page in [
        PageSort {
            limit: Some(usize::MAX),
            ..Default::default()
        },
        PageSort {
            offset: Some(usize::MAX),
            ..Default::default()
        },
    ] {
        let request = ListItems {
            page,
            ..Default::default()
        };
        let err = fx.items.list(&fx.ann, request).await.unwrap_err();
        assert_eq!(err, expected);
    }

    let largest = ListItems {
        page: PageSort {
            limit: Some(i64::MAX as usize),
            offset: Some(1),
            ..Default::default()
        },
        ..Default::default()
    };
    let page = fx.items.list(&fx.ann, largest).await.unwrap();
    assert_eq!(page.total, 1);
    assert!(page.items.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_is_owner_only() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;
    fx.items.share(&fx.ann, item.id, &[fx.bob.id]).await.unwrap();

    let err = fx.items.delete(&fx.bob, item.id).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Authorization(messages::CANNOT_DELETE.to_string())
    );

    fx.items.delete(&fx.ann, item.id).await.expect("Owner may delete");

    let err = fx.items.delete(&fx.ann, item.id).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::NotFound(messages::ITEM_NOT_FOUND.to_string())
    );
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn update_rename_with_same_tags_succeeds() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    let mut request = update_from(&item, strings(&["Test1"]));
    request.name = "Test1Modify".to_string();

    let version = fx
        .items
        .update(&fx.ann, item.id, request)
        .await
        .expect("Update should succeed");
    assert_ne!(version, item.version);

    let reloaded = fx.items.get(&fx.ann, item.id).await.unwrap();
    assert_eq!(reloaded.name, "Test1Modify");
    assert_eq!(reloaded.tags, vec!["Test1"]);
    assert_eq!(reloaded.version, version);
}

#[tokio::test(flavor = "multi_thread")]
async fn update_invalid_enums_fail_before_store_access() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;
    let before = fx.calls();

    let mut bad_status = update_from(&item, vec![]);
    bad_status.status = "Finished".to_string();
    let err = fx.items.update(&fx.cat, 9999, bad_status).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Validation(messages::INVALID_STATUS.to_string())
    );

    let mut bad_priority = update_from(&item, vec![]);
    bad_priority.priority = "Critical".to_string();
    let err = fx.items.update(&fx.cat, item.id, bad_priority).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Validation(messages::INVALID_PRIORITY.to_string())
    );

    assert_eq!(fx.calls(), before, "validation must not touch the store");
}

#[tokio::test(flavor = "multi_thread")]
async fn update_accepts_every_valid_status_and_priority() {
    let fx = setup(Race::Quiet).await;
    let mut item = seed_item(&fx).await;

    for (status, priority) in [
        ("In Progress", "Medium"),
        ("Completed", "High"),
        ("Not Started", "Low"),
    ] {
        let mut request = update_from(&item, item.tags.clone());
        request.status = status.to_string();
        request.priority = priority.to_string();

        fx.items
            .update(&fx.ann, item.id, request)
            .await
            .expect("Valid enums should pass");
        item = fx.items.get(&fx.ann, item.id).await.unwrap();
        assert_eq!(item.status.to_string(), status);
        assert_eq!(item.priority.to_string(), priority);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn update_identical_state_is_noop_regardless_of_version() {
    let fx = setup(Race::Quiet).await;
    let item = fx
        .items
        .create(
            &fx.ann,
            CreateItem {
                name: "Pair".to_string(),
                description: String::new(),
                due_date: due(),
                priority: "Low".to_string(),
            },
        )
        .await
        .unwrap();
    fx.items
        .update(&fx.ann, item.id, update_from(&item, strings(&["a", "b"])))
        .await
        .unwrap();

    let mut request = update_from(&item, strings(&["b", "a"]));
    request.version = Some(VersionToken::generate());

    let err = fx.items.update(&fx.ann, item.id, request).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::NoOp(messages::ITEM_AND_TAGS_SAME.to_string())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn update_without_version_is_noop_or_validation_error() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    let mut unchanged = update_from(&item, item.tags.clone());
    unchanged.version = None;
    let err = fx.items.update(&fx.ann, item.id, unchanged).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::NoOp(messages::ITEM_AND_TAGS_SAME.to_string())
    );

    let mut renamed = update_from(&item, item.tags.clone());
    renamed.name = "Renamed".to_string();
    renamed.version = None;
    let err = fx.items.update(&fx.ann, item.id, renamed).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Validation(messages::INVALID_VERSION.to_string())
    );

    let stored = fx.items.get(&fx.ann, item.id).await.unwrap();
    assert_eq!(stored.name, "Test1");
    assert_eq!(stored.version, item.version);
}

#[tokio::test(flavor = "multi_thread")]
async fn update_ignores_sub_second_due_date_noise() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    let mut request = update_from(&item, item.tags.clone());
    request.due_date = item.due_date + chrono::Duration::milliseconds(250);

    let err = fx.items.update(&fx.ann, item.id, request).await.unwrap_err();
    assert!(matches!(err, ServiceError::NoOp(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn update_tags_only_keeps_version() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    let version = fx
        .items
        .update(&fx.ann, item.id, update_from(&item, strings(&["Test1", "extra"])))
        .await
        .unwrap();
    assert_eq!(version, item.version);

    let reloaded = fx.items.get(&fx.ann, item.id).await.unwrap();
    assert_eq!(reloaded.tags, vec!["Test1", "extra"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn update_by_stranger_is_authorization_not_not_found() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    let mut request = update_from(&item, vec![]);
    request.name = "Hijacked".to_string();

    let err = fx.items.update(&fx.cat, item.id, request).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Authorization(messages::CANNOT_UPDATE.to_string())
    );
    assert_ne!(err.message(), messages::ITEM_NOT_FOUND);
    assert_ne!(err.message(), messages::ITEM_NOT_EXIST);
}

#[tokio::test(flavor = "multi_thread")]
async fn update_by_shared_user_succeeds() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;
    fx.items.share(&fx.ann, item.id, &[fx.bob.id]).await.unwrap();

    let mut request = update_from(&item, item.tags.clone());
    request.status = "In Progress".to_string();

    fx.items
        .update(&fx.bob, item.id, request)
        .await
        .expect("Shared user may update");
}

#[tokio::test(flavor = "multi_thread")]
async fn update_missing_item_reports_not_exist() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    let err = fx
        .items
        .update(&fx.ann, item.id + 100, update_from(&item, vec![]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::NotFound(messages::ITEM_NOT_EXIST.to_string())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn update_with_outdated_version_conflicts() {
    let fx = setup(Race::Quiet).await;
    let v1 = seed_item(&fx).await;

    let mut first = update_from(&v1, v1.tags.clone());
    first.name = "First".to_string();
    fx.items.update(&fx.ann, v1.id, first).await.unwrap();

    let mut second = update_from(&v1, v1.tags.clone());
    second.name = "Second".to_string();
    let err = fx.items.update(&fx.ann, v1.id, second).await.unwrap_err();

    assert_eq!(
        err,
        ServiceError::Conflict(messages::ITEM_UPDATED_BY_OTHERS.to_string())
    );
    assert_eq!(fx.items.get(&fx.ann, v1.id).await.unwrap().name, "First");
}

#[tokio::test(flavor = "multi_thread")]
async fn update_racing_writer_yields_conflict_and_no_partial_tags() {
    let fx = setup(Race::Touch).await;
    let item = seed_item(&fx).await;

    let mut request = update_from(&item, strings(&["Test1", "mine"]));
    request.name = "Mine".to_string();

    let err = fx.items.update(&fx.ann, item.id, request).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Conflict(messages::ITEM_UPDATED_BY_OTHERS.to_string())
    );

    let reloaded = fx.items.get(&fx.ann, item.id).await.unwrap();
    assert_eq!(reloaded.name, "Test1");
    assert!(reloaded.description.ends_with("(edited elsewhere)"));
    assert_eq!(reloaded.tags, vec!["Test1"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn update_racing_delete_yields_not_found() {
    let fx = setup(Race::Delete).await;
    let item = fx
        .items
        .create(
            &fx.ann,
            CreateItem {
                name: "Short lived".to_string(),
                description: String::new(),
                due_date: due(),
                priority: "Low".to_string(),
            },
        )
        .await
        .unwrap();

    let mut request = update_from(&item, vec![]);
    request.name = "Renamed".to_string();

    let err = fx.items.update(&fx.ann, item.id, request).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::NotFound(messages::ITEM_NOT_FOUND.to_string())
    );
}

// =============================================================================
// Share
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn share_same_list_twice_is_noop() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    fx.items
        .share(&fx.ann, item.id, &[fx.bob.id, fx.cat.id])
        .await
        .expect("First share should succeed");

    let err = fx
        .items
        .share(&fx.ann, item.id, &[fx.cat.id, fx.bob.id])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::NoOp(messages::USERS_TO_SHARE_SAME.to_string())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn share_empty_list_unshares_everyone() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;
    fx.items.share(&fx.ann, item.id, &[fx.bob.id]).await.unwrap();

    fx.items
        .share(&fx.ann, item.id, &[])
        .await
        .expect("Unsharing should succeed");

    let err = fx.items.get(&fx.bob, item.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Authorization(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn share_with_only_owner_is_noop() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    let err = fx
        .items
        .share(&fx.ann, item.id, &[fx.ann.id])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoOp(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn share_by_shared_user_is_refused() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;
    fx.items.share(&fx.ann, item.id, &[fx.bob.id]).await.unwrap();

    let err = fx
        .items
        .share(&fx.bob, item.id, &[fx.bob.id, fx.cat.id])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::Authorization(messages::CANNOT_SHARE.to_string())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn share_with_unknown_user_is_not_found() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    let err = fx
        .items
        .share(&fx.ann, item.id, &[fx.bob.id, 4242])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::NotFound(messages::USER_NOT_FOUND.to_string())
    );
    assert!(fx.items.get(&fx.bob, item.id).await.is_err(), "nothing shared");
}

#[tokio::test(flavor = "multi_thread")]
async fn share_missing_item_is_not_found() {
    let fx = setup(Race::Quiet).await;

    let err = fx.items.share(&fx.ann, 777, &[fx.bob.id]).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::NotFound(messages::ITEM_NOT_FOUND.to_string())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn available_users_exclude_owner() {
    let fx = setup(Race::Quiet).await;
    let item = seed_item(&fx).await;

    let users = fx.items.available_users(item.id).await.unwrap();
    let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["bob", "cat"]);

    let err = fx.items.available_users(item.id + 1).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::NotFound(messages::ITEM_NOT_FOUND_FOR_SHARING.to_string())
    );
}
