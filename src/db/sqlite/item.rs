//! SQLite ItemRepository implementation.

use std::collections::HashMap;
use std::str::FromStr;

use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::helpers::{build_limit_offset_clause, build_order_clause, placeholders};
use crate::db::utils::{escape_like, format_timestamp, parse_timestamp};
use crate::db::{
    CommitOutcome, DbError, DbResult, Id, Item, ItemChangeSet, ItemPriority, ItemQuery,
    ItemRepository, ItemStatus, ListResult, NewItem, Share, ShareChangeSet, Tag, VersionToken,
};

/// SQLx-backed to-do item repository.
pub struct SqliteItemRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

const ITEM_COLUMNS: &str = "id, name, description, due_date, status, priority, owner_id, version, \
     (SELECT username FROM users u WHERE u.id = todo_item.owner_id) AS owner_username";

const SORT_FIELDS: [&str; 4] = ["name", "status", "priority", "due_date"];

impl<'a> ItemRepository for SqliteItemRepository<'a> {
    async fn create(&self, item: &NewItem) -> DbResult<Item> {
        let version = VersionToken::generate();
        let status = ItemStatus::NotStarted;

        let result = sqlx::query(
            r#"
            INSERT INTO todo_item (name, description, due_date, status, priority, owner_id, version)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(format_timestamp(&item.due_date))
        .bind(status.to_string())
        .bind(item.priority.to_string())
        .bind(item.owner_id)
        .bind(version.as_bytes())
        .execute(self.pool)
        .await?;

        self.get(result.last_insert_rowid()).await
    }

    async fn get(&self, id: Id) -> DbResult<Item> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM todo_item WHERE id = ?",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let row = row.ok_or(DbError::NotFound {
            entity_type: "Item".to_string(),
            id: id.to_string(),
        })?;

        let mut item = row_to_item(&row)?;
        item.tags = self.tags(id).await?.into_iter().map(|t| t.name).collect();
        Ok(item)
    }

    async fn exists(&self, id: Id) -> DbResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM todo_item WHERE id = ?)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    async fn list(&self, query: &ItemQuery) -> DbResult<ListResult<Item>> {
        let order_clause = build_order_clause(&query.page, &SORT_FIELDS, "id");
        let limit_clause = build_limit_offset_clause(&query.page);

        let mut select: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM todo_item", ITEM_COLUMNS));
        push_conditions(&mut select, query);
        select.push(format!(" {}{}", order_clause, limit_clause));

        let rows = select.build().fetch_all(self.pool).await?;
        let mut items = rows.iter().map(row_to_item).collect::<DbResult<Vec<_>>>()?;

        let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM todo_item");
        push_conditions(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let ids: Vec<Id> = items.iter().map(|item| item.id).collect();
        let mut tags = self.tag_names_for(&ids).await?;
        for item in &mut items {
            item.tags = tags.remove(&item.id).unwrap_or_default();
        }

        Ok(ListResult {
            items,
            total: total as usize,
            limit: query.page.limit,
            offset: query.page.offset.unwrap_or(0),
        })
    }

    async fn tags(&self, item_id: Id) -> DbResult<Vec<Tag>> {
        let rows =
            sqlx::query("SELECT id, item_id, name FROM todo_item_tag WHERE item_id = ? ORDER BY id")
                .bind(item_id)
                .fetch_all(self.pool)
                .await?;

        Ok(rows
            .iter()
            .map(|row| Tag {
                id: row.get("id"),
                item_id: row.get("item_id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn shares(&self, item_id: Id) -> DbResult<Vec<Share>> {
        let rows = sqlx::query(
            "SELECT id, item_id, user_id FROM todo_item_share WHERE item_id = ? ORDER BY id",
        )
        .bind(item_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Share {
                id: row.get("id"),
                item_id: row.get("item_id"),
                user_id: row.get("user_id"),
            })
            .collect())
    }

    async fn apply(&self, change: &ItemChangeSet) -> DbResult<CommitOutcome> {
        // Dropping `tx` without commit rolls everything back
        let mut tx = self.pool.begin().await?;
        let mut version = None;

        if let Some(update) = &change.fields {
            let next = VersionToken::generate();
            let fields = &update.fields;

            let result = sqlx::query(
                r#"
                UPDATE todo_item
                SET name = ?, description = ?, due_date = ?, status = ?, priority = ?, version = ?
                WHERE id = ? AND version = ?
                "#,
            )
            .bind(&fields.name)
            .bind(&fields.description)
            .bind(format_timestamp(&fields.due_date))
            .bind(fields.status.to_string())
            .bind(fields.priority.to_string())
            .bind(next.as_bytes())
            .bind(change.item_id)
            .bind(update.expected_version.as_bytes())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Ok(CommitOutcome::Conflict);
            }
            version = Some(next);
        } else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM todo_item WHERE id = ?)")
                    .bind(change.item_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !exists {
                return Ok(CommitOutcome::Conflict);
            }
        }

        for tag_id in &change.delete_tag_ids {
            sqlx::query("DELETE FROM todo_item_tag WHERE id = ? AND item_id = ?")
                .bind(tag_id)
                .bind(change.item_id)
                .execute(&mut *tx)
                .await?;
        }

        for name in &change.insert_tags {
            sqlx::query("INSERT INTO todo_item_tag (item_id, name) VALUES (?, ?)")
                .bind(change.item_id)
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(CommitOutcome::Committed { version })
    }

    async fn apply_shares(&self, change: &ShareChangeSet) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        for share_id in &change.delete_share_ids {
            sqlx::query("DELETE FROM todo_item_share WHERE id = ? AND item_id = ?")
                .bind(share_id)
                .bind(change.item_id)
                .execute(&mut *tx)
                .await?;
        }

        for user_id in &change.insert_user_ids {
            sqlx::query("INSERT INTO todo_item_share (item_id, user_id) VALUES (?, ?)")
                .bind(change.item_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: Id) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM todo_item_tag WHERE item_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM todo_item_share WHERE item_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM todo_item WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                entity_type: "Item".to_string(),
                id: id.to_string(),
            });
        }

        tx.commit().await?;
        Ok(())
    }
}

impl SqliteItemRepository<'_> {
    /// Tag names for several items in one query, keyed by item id.
    async fn tag_names_for(&self, item_ids: &[Id]) -> DbResult<HashMap<Id, Vec<String>>> {
        let mut names: HashMap<Id, Vec<String>> = HashMap::new();
        if item_ids.is_empty() {
            return Ok(names);
        }

        let sql = format!(
            "SELECT item_id, name FROM todo_item_tag WHERE item_id IN ({}) ORDER BY id",
            placeholders(item_ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in item_ids {
            query = query.bind(id);
        }

        for row in query.fetch_all(self.pool).await? {
            names
                .entry(row.get("item_id"))
                .or_default()
                .push(row.get("name"));
        }
        Ok(names)
    }
}

/// Append the WHERE clause for visibility and filters.
fn push_conditions(builder: &mut QueryBuilder<'_, Sqlite>, query: &ItemQuery) {
    builder.push(" WHERE 1 = 1");

    if let Some(user_id) = query.visible_to {
        builder
            .push(" AND (owner_id = ")
            .push_bind(user_id)
            .push(
                " OR EXISTS (SELECT 1 FROM todo_item_share s \
                 WHERE s.item_id = todo_item.id AND s.user_id = ",
            )
            .push_bind(user_id)
            .push("))");
    }

    let filter = &query.filter;

    if let Some(name) = &filter.name {
        builder
            .push(" AND name LIKE ")
            .push_bind(format!("%{}%", escape_like(name)))
            .push(" ESCAPE '\\'");
    }

    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.to_string());
    }

    if let Some(priority) = filter.priority {
        builder.push(" AND priority = ").push_bind(priority.to_string());
    }

    if let Some(tag) = &filter.tag {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM todo_item_tag t \
                 WHERE t.item_id = todo_item.id AND t.name LIKE ",
            )
            .push_bind(format!("%{}%", escape_like(tag)))
            .push(" ESCAPE '\\')");
    }

    if let Some(start) = &filter.start_date {
        builder
            .push(" AND due_date >= ")
            .push_bind(format_timestamp(start));
    }

    if let Some(end) = &filter.end_date {
        builder
            .push(" AND due_date <= ")
            .push_bind(format_timestamp(end));
    }
}

/// Convert a database row to an Item model. Tags are filled in by the caller.
fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> DbResult<Item> {
    let status_str: String = row.get("status");
    let status = ItemStatus::from_str(&status_str).map_err(|message| DbError::InvalidData {
        message,
        help: "Status must be 'Not Started', 'In Progress' or 'Completed'".to_string(),
    })?;

    let priority_str: String = row.get("priority");
    let priority = ItemPriority::from_str(&priority_str).map_err(|message| DbError::InvalidData {
        message,
        help: "Priority must be 'Low', 'Medium' or 'High'".to_string(),
    })?;

    let due_date: String = row.get("due_date");

    Ok(Item {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        owner_username: row
            .get::<Option<String>, _>("owner_username")
            .unwrap_or_default(),
        name: row.get("name"),
        description: row.get("description"),
        due_date: parse_timestamp(&due_date)?,
        status,
        priority,
        tags: Vec::new(),
        version: VersionToken::from_bytes(row.get("version")),
    })
}
