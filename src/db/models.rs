//! Domain models for the to-do database.
//!
//! These models are storage-agnostic value records. Related rows (tags,
//! shares) are always fetched explicitly; nothing is lazily loaded.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// Query Types for Pagination and Sorting
// =============================================================================

/// Sort order for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Base pagination and sorting options - composed into entity-specific queries.
#[derive(Debug, Clone, Default)]
pub struct PageSort {
    /// Maximum number of items to return.
    pub limit: Option<usize>,
    /// Number of items to skip.
    pub offset: Option<usize>,
    /// Field to sort by (validated per entity type).
    pub sort_by: Option<String>,
    /// Sort order (ascending or descending).
    pub sort_order: Option<SortOrder>,
}

/// Filters applied when listing to-do items. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Substring of the item name.
    pub name: Option<String>,
    pub status: Option<ItemStatus>,
    pub priority: Option<ItemPriority>,
    /// Substring of any tag name on the item.
    pub tag: Option<String>,
    /// Inclusive lower bound on the due date.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the due date.
    pub end_date: Option<DateTime<Utc>>,
}

/// Query for to-do items - visibility + filters + pagination.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub page: PageSort,
    pub filter: ItemFilter,
    /// Only items owned by or shared with this user.
    pub visible_to: Option<Id>,
}

/// Query for users.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    /// Leave out users holding this role.
    pub exclude_role: Option<UserRole>,
    /// Leave out this user.
    pub exclude_id: Option<Id>,
}

/// Result of a paginated list query.
#[derive(Debug, Clone)]
pub struct ListResult<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Total count of all matching items (before pagination).
    pub total: usize,
    /// Limit that was applied.
    pub limit: Option<usize>,
    /// Offset that was applied.
    pub offset: usize,
}

/// Row identifier used for all entities.
pub type Id = i64;

// =============================================================================
// Version Tokens
// =============================================================================

/// Opaque row version, replaced on every committed write of the row.
///
/// Serialized as a base64 string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(Vec<u8>);

impl VersionToken {
    /// Produce a fresh random token.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes().to_vec())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        STANDARD.decode(encoded).map(Self)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl Serialize for VersionToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for VersionToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        VersionToken::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Outcome of a version-checked commit.
///
/// A stale expected version is not an error: the caller decides what a
/// conflict means (deleted concurrently vs. updated by someone else).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// All writes persisted. `version` is the new row token when the row itself was written.
    Committed { version: Option<VersionToken> },
    /// Expected version did not match (or the row vanished); nothing was written.
    Conflict,
}

// =============================================================================
// Users
// =============================================================================

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "User"),
            UserRole::Admin => write!(f, "Admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(UserRole::User),
            "Admin" => Ok(UserRole::Admin),
            _ => Err(format!("Invalid UserRole: {}", s)),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub version: VersionToken,
}

/// Salted password digest as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    pub hash: Vec<u8>,
    pub salt: Vec<u8>,
}

/// Account to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: PasswordDigest,
}

// =============================================================================
// To-do Items
// =============================================================================

/// Progress state of a to-do item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::NotStarted => write!(f, "Not Started"),
            ItemStatus::InProgress => write!(f, "In Progress"),
            ItemStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not Started" => Ok(ItemStatus::NotStarted),
            "In Progress" => Ok(ItemStatus::InProgress),
            "Completed" => Ok(ItemStatus::Completed),
            _ => Err(format!("Invalid ItemStatus: {}", s)),
        }
    }
}

/// Priority of a to-do item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemPriority {
    #[default]
    Low,
    Medium,
    High,
}

impl std::fmt::Display for ItemPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemPriority::Low => write!(f, "Low"),
            ItemPriority::Medium => write!(f, "Medium"),
            ItemPriority::High => write!(f, "High"),
        }
    }
}

impl std::str::FromStr for ItemPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(ItemPriority::Low),
            "Medium" => Ok(ItemPriority::Medium),
            "High" => Ok(ItemPriority::High),
            _ => Err(format!("Invalid ItemPriority: {}", s)),
        }
    }
}

/// The mutable scalar fields of an item, compared as a unit when diffing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFields {
    pub name: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: ItemStatus,
    pub priority: ItemPriority,
}

/// A to-do item with its tag names and owner's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Id,
    pub owner_id: Id,
    pub owner_username: String,
    pub name: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: ItemStatus,
    pub priority: ItemPriority,
    pub tags: Vec<String>,
    pub version: VersionToken,
}

impl Item {
    pub fn fields(&self) -> ItemFields {
        ItemFields {
            name: self.name.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            status: self.status,
            priority: self.priority,
        }
    }
}

/// Item to be inserted. Status always starts as NotStarted.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub owner_id: Id,
    pub name: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: ItemPriority,
}

/// A tag row attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Id,
    pub item_id: Id,
    pub name: String,
}

/// A share row granting a user access to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub id: Id,
    pub item_id: Id,
    pub user_id: Id,
}

/// Version-checked field write.
#[derive(Debug, Clone)]
pub struct FieldUpdate {
    pub fields: ItemFields,
    pub expected_version: VersionToken,
}

/// Everything one item update writes, committed as a single transaction.
#[derive(Debug, Clone)]
pub struct ItemChangeSet {
    pub item_id: Id,
    /// Present only when scalar fields changed.
    pub fields: Option<FieldUpdate>,
    pub insert_tags: Vec<String>,
    pub delete_tag_ids: Vec<Id>,
}

/// Share rows to add and remove for one item, committed as a single transaction.
#[derive(Debug, Clone)]
pub struct ShareChangeSet {
    pub item_id: Id,
    pub insert_user_ids: Vec<Id>,
    pub delete_share_ids: Vec<Id>,
}
