//! To-do item handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use super::{ApiFailure, ErrorResponse, MessageResponse, ResponseStatus, decode_version, failure};
use crate::api::{AppState, CurrentUser};
use crate::db::{Database, Id, Item, PageSort, SortOrder};
use crate::service::{AvailableUser, CreateItem, ListItems, UpdateItem, messages};

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    #[schema(example = 1)]
    pub id: Id,
    #[schema(example = "Write report")]
    pub name: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    #[schema(example = "Not Started")]
    pub status: String,
    #[schema(example = "Low")]
    pub priority: String,
    pub owner_id: Id,
    #[schema(example = "ann")]
    pub owner_username: String,
    #[schema(example = json!(["work", "urgent"]))]
    pub tags: Vec<String>,
    /// Base64 version token; send it back when updating.
    #[schema(example = "q83vEjRWeJA=")]
    pub version: String,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            due_date: item.due_date,
            status: item.status.to_string(),
            priority: item.priority.to_string(),
            owner_id: item.owner_id,
            owner_username: item.owner_username,
            tags: item.tags,
            version: item.version.to_base64(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SingleItemResponse {
    pub status: ResponseStatus,
    #[schema(example = "Get ToDo Item Successfully!")]
    pub message: String,
    pub item: ItemResponse,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    #[schema(example = "Write report")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub due_date: DateTime<Utc>,
    /// Low, Medium or High
    #[schema(example = "Medium")]
    pub priority: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    #[schema(example = "Write report")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub due_date: DateTime<Utc>,
    /// Not Started, In Progress or Completed
    #[schema(example = "In Progress")]
    pub status: String,
    #[schema(example = "High")]
    pub priority: String,
    /// The complete tag set the item should end up with
    #[schema(example = json!(["work"]))]
    #[serde(default)]
    pub tags: Vec<String>,
    /// Version token from the last read
    #[schema(example = "q83vEjRWeJA=")]
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdatedItemResponse {
    pub status: ResponseStatus,
    #[schema(example = "Update ToDo Item Successfully!")]
    pub message: String,
    /// New version token
    pub version: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ShareItemRequest {
    /// The complete set of users the item should be shared with
    #[schema(example = json!([2, 3]))]
    #[serde(default)]
    pub user_ids: Vec<Id>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailableUserResponse {
    pub id: Id,
    #[schema(example = "bob")]
    pub username: String,
}

impl From<AvailableUser> for AvailableUserResponse {
    fn from(user: AvailableUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailableUsersResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub users: Vec<AvailableUserResponse>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListItemsQuery {
    /// Substring of the item name
    #[param(example = "report")]
    pub name: Option<String>,
    /// Not Started, In Progress or Completed
    #[param(example = "In Progress")]
    pub status: Option<String>,
    /// Low, Medium or High
    #[param(example = "High")]
    pub priority: Option<String>,
    /// Substring of any tag name
    #[param(example = "work")]
    pub tag: Option<String>,
    /// Due on or after
    pub start_date: Option<DateTime<Utc>>,
    /// Due on or before
    pub end_date: Option<DateTime<Utc>>,
    /// Field to sort by (name, status, priority, due_date)
    #[param(example = "due_date")]
    pub sort: Option<String>,
    /// Sort order (asc, desc)
    #[param(example = "asc")]
    pub order: Option<String>,
    /// Maximum number of items to return
    #[param(example = 20)]
    pub limit: Option<usize>,
    /// Number of items to skip
    #[param(example = 0)]
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedItems {
    pub status: ResponseStatus,
    #[schema(example = "Get ToDo Items Successfully!")]
    pub message: String,
    pub items: Vec<ItemResponse>,
    pub total: usize,
    pub limit: Option<usize>,
    pub offset: usize,
}

// =============================================================================
// Handlers
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/v1/todo-items",
    tag = "todo-items",
    params(ListItemsQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Items owned by or shared with the caller", body = PaginatedItems),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, caller), fields(caller = caller.user.id))]
pub async fn list_items<D: Database + 'static>(
    State(state): State<AppState<D>>,
    caller: CurrentUser,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<PaginatedItems>, ApiFailure> {
    let request = ListItems {
        name: query.name,
        status: query.status,
        priority: query.priority,
        tag: query.tag,
        start_date: query.start_date,
        end_date: query.end_date,
        page: PageSort {
            limit: query.limit,
            offset: query.offset,
            sort_by: query.sort,
            sort_order: match query.order.as_deref() {
                Some("desc") => Some(SortOrder::Desc),
                Some("asc") => Some(SortOrder::Asc),
                _ => None,
            },
        },
    };

    let result = state
        .items()
        .list(&caller.user, request)
        .await
        .map_err(failure)?;
    info!(total = result.total, "{}", messages::GET_ITEMS_SUCCESS);

    Ok(Json(PaginatedItems {
        status: ResponseStatus::Success,
        message: messages::GET_ITEMS_SUCCESS.to_string(),
        items: result.items.into_iter().map(ItemResponse::from).collect(),
        total: result.total,
        limit: result.limit,
        offset: result.offset,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/todo-items/{id}",
    tag = "todo-items",
    params(("id" = i64, Path, description = "Item ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Item found", body = SingleItemResponse),
        (status = 403, description = "Caller may not view this item", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, caller), fields(caller = caller.user.id))]
pub async fn get_item<D: Database + 'static>(
    State(state): State<AppState<D>>,
    caller: CurrentUser,
    Path(id): Path<Id>,
) -> Result<Json<SingleItemResponse>, ApiFailure> {
    let item = state
        .items()
        .get(&caller.user, id)
        .await
        .map_err(failure)?;
    info!("{}", messages::GET_ITEM_SUCCESS);

    Ok(Json(SingleItemResponse {
        status: ResponseStatus::Success,
        message: messages::GET_ITEM_SUCCESS.to_string(),
        item: ItemResponse::from(item),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/todo-items",
    tag = "todo-items",
    request_body = CreateItemRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Item created", body = SingleItemResponse),
        (status = 400, description = "Invalid priority", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, caller), fields(caller = caller.user.id))]
pub async fn create_item<D: Database + 'static>(
    State(state): State<AppState<D>>,
    caller: CurrentUser,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<SingleItemResponse>), ApiFailure> {
    let request = CreateItem {
        name: req.name,
        description: req.description,
        due_date: req.due_date,
        priority: req.priority,
    };

    let item = state
        .items()
        .create(&caller.user, request)
        .await
        .map_err(failure)?;
    info!(item_id = item.id, "{}", messages::CREATE_ITEM_SUCCESS);

    Ok((
        StatusCode::CREATED,
        Json(SingleItemResponse {
            status: ResponseStatus::Success,
            message: messages::CREATE_ITEM_SUCCESS.to_string(),
            item: ItemResponse::from(item),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/todo-items/{id}",
    tag = "todo-items",
    params(("id" = i64, Path, description = "Item ID")),
    request_body = UpdateItemRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Item updated", body = UpdatedItemResponse),
        (status = 400, description = "Invalid input or nothing changed", body = ErrorResponse),
        (status = 403, description = "Caller may not update this item", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 409, description = "Item was updated by someone else", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, caller, req), fields(caller = caller.user.id))]
pub async fn update_item<D: Database + 'static>(
    State(state): State<AppState<D>>,
    caller: CurrentUser,
    Path(id): Path<Id>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<UpdatedItemResponse>, ApiFailure> {
    let request = UpdateItem {
        version: decode_version(&req.version),
        name: req.name,
        description: req.description,
        due_date: req.due_date,
        status: req.status,
        priority: req.priority,
        tags: req.tags,
    };

    let version = state
        .items()
        .update(&caller.user, id, request)
        .await
        .map_err(failure)?;
    info!("{}", messages::UPDATE_ITEM_SUCCESS);

    Ok(Json(UpdatedItemResponse {
        status: ResponseStatus::Success,
        message: messages::UPDATE_ITEM_SUCCESS.to_string(),
        version: version.to_base64(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/todo-items/{id}",
    tag = "todo-items",
    params(("id" = i64, Path, description = "Item ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Item deleted", body = MessageResponse),
        (status = 403, description = "Only the owner may delete", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, caller), fields(caller = caller.user.id))]
pub async fn delete_item<D: Database + 'static>(
    State(state): State<AppState<D>>,
    caller: CurrentUser,
    Path(id): Path<Id>,
) -> Result<Json<MessageResponse>, ApiFailure> {
    state
        .items()
        .delete(&caller.user, id)
        .await
        .map_err(failure)?;
    info!("{}", messages::DELETE_ITEM_SUCCESS);

    Ok(Json(MessageResponse::success(messages::DELETE_ITEM_SUCCESS)))
}

#[utoipa::path(
    put,
    path = "/api/v1/todo-items/{id}/shares",
    tag = "todo-items",
    params(("id" = i64, Path, description = "Item ID")),
    request_body = ShareItemRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Share list replaced", body = MessageResponse),
        (status = 400, description = "Share list unchanged", body = ErrorResponse),
        (status = 403, description = "Only the owner may share", body = ErrorResponse),
        (status = 404, description = "Item or user not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, caller), fields(caller = caller.user.id))]
pub async fn share_item<D: Database + 'static>(
    State(state): State<AppState<D>>,
    caller: CurrentUser,
    Path(id): Path<Id>,
    Json(req): Json<ShareItemRequest>,
) -> Result<Json<MessageResponse>, ApiFailure> {
    state
        .items()
        .share(&caller.user, id, &req.user_ids)
        .await
        .map_err(failure)?;
    info!("{}", messages::SHARE_ITEM_SUCCESS);

    Ok(Json(MessageResponse::success(messages::SHARE_ITEM_SUCCESS)))
}

#[utoipa::path(
    get,
    path = "/api/v1/todo-items/{id}/available-users",
    tag = "todo-items",
    params(("id" = i64, Path, description = "Item ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Users the item could be shared with", body = AvailableUsersResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _caller))]
pub async fn available_users<D: Database + 'static>(
    State(state): State<AppState<D>>,
    _caller: CurrentUser,
    Path(id): Path<Id>,
) -> Result<Json<AvailableUsersResponse>, ApiFailure> {
    let users = state.items().available_users(id).await.map_err(failure)?;
    info!(count = users.len(), "{}", messages::AVAILABLE_USERS_SUCCESS);

    Ok(Json(AvailableUsersResponse {
        status: ResponseStatus::Success,
        message: messages::AVAILABLE_USERS_SUCCESS.to_string(),
        users: users.into_iter().map(AvailableUserResponse::from).collect(),
    }))
}
