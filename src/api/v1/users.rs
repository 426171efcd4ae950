//! User administration handlers. Admin only.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{ApiFailure, ErrorResponse, ResponseStatus, failure, parse_version};
use crate::api::{AppState, CurrentUser};
use crate::db::{Database, Id, User};
use crate::service::messages;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Id,
    #[schema(example = "ann")]
    pub username: String,
    #[schema(example = "ann@example.com")]
    pub email: String,
    #[schema(example = "User")]
    pub role: String,
    /// Base64 version token; send it back when changing the role.
    pub version: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            version: user.version.to_base64(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsersResponse {
    pub status: ResponseStatus,
    #[schema(example = "Get Users Successfully!")]
    pub message: String,
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SingleUserResponse {
    pub status: ResponseStatus,
    #[schema(example = "Get User Successfully!")]
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    /// User or Admin
    #[schema(example = "Admin")]
    pub role: String,
    /// Version token from the last read of this user
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChangedRoleResponse {
    pub status: ResponseStatus,
    #[schema(example = "Change User Role Successfully!")]
    pub message: String,
    /// New version token
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All non-admin users", body = UsersResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, caller), fields(caller = caller.user.id))]
pub async fn list_users<D: Database + 'static>(
    State(state): State<AppState<D>>,
    caller: CurrentUser,
) -> Result<Json<UsersResponse>, ApiFailure> {
    let users = state.users().list(&caller.user).await.map_err(failure)?;
    info!(count = users.len(), "{}", messages::GET_USERS_SUCCESS);

    Ok(Json(UsersResponse {
        status: ResponseStatus::Success,
        message: messages::GET_USERS_SUCCESS.to_string(),
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User found", body = SingleUserResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, caller), fields(caller = caller.user.id))]
pub async fn get_user<D: Database + 'static>(
    State(state): State<AppState<D>>,
    caller: CurrentUser,
    Path(id): Path<Id>,
) -> Result<Json<SingleUserResponse>, ApiFailure> {
    let user = state
        .users()
        .get(&caller.user, id)
        .await
        .map_err(failure)?;
    info!("{}", messages::GET_USER_SUCCESS);

    Ok(Json(SingleUserResponse {
        status: ResponseStatus::Success,
        message: messages::GET_USER_SUCCESS.to_string(),
        user: UserResponse::from(user),
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/role",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    request_body = ChangeRoleRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Role changed", body = ChangedRoleResponse),
        (status = 400, description = "Unknown role or role unchanged", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "User was updated by someone else", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, caller), fields(caller = caller.user.id))]
pub async fn change_role<D: Database + 'static>(
    State(state): State<AppState<D>>,
    caller: CurrentUser,
    Path(id): Path<Id>,
    Json(req): Json<ChangeRoleRequest>,
) -> Result<Json<ChangedRoleResponse>, ApiFailure> {
    let expected = parse_version(&req.version)?;

    let version = state
        .users()
        .change_role(&caller.user, id, &req.role, expected)
        .await
        .map_err(failure)?;
    info!(user_id = id, role = %req.role, "{}", messages::CHANGE_ROLE_SUCCESS);

    Ok(Json(ChangedRoleResponse {
        status: ResponseStatus::Success,
        message: messages::CHANGE_ROLE_SUCCESS.to_string(),
        version: version.to_base64(),
    }))
}
