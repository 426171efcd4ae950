//! Registration, login and logout handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{ApiFailure, ErrorResponse, MessageResponse, ResponseStatus, failure};
use crate::api::{AppState, CurrentUser};
use crate::db::{Database, Id};
use crate::service::{RegisterUser, messages};

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "ann")]
    pub username: String,
    #[schema(example = "ann@example.com")]
    pub email: String,
    /// 8+ characters with upper, lower, digit and one of @$!%*?&
    #[schema(example = "Passw0rd!")]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ann@example.com")]
    pub email: String,
    #[schema(example = "Passw0rd!")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub status: ResponseStatus,
    #[schema(example = "Login Successfully!")]
    pub message: String,
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub user_id: Id,
    #[schema(example = "ann")]
    pub username: String,
    #[schema(example = "User")]
    pub role: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/authentication/register",
    tag = "authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Invalid input or email taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn register<D: Database + 'static>(
    State(state): State<AppState<D>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiFailure> {
    let user = state
        .users()
        .register(RegisterUser {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await
        .map_err(failure)?;
    info!(user_id = user.id, "{}", messages::USER_CREATED);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::success(messages::USER_CREATED)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/authentication/login",
    tag = "authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Wrong password", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn login<D: Database + 'static>(
    State(state): State<AppState<D>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiFailure> {
    let session = state
        .users()
        .login(&req.email, &req.password)
        .await
        .map_err(failure)?;
    info!(user_id = session.user.id, "{}", messages::LOGIN_SUCCESS);

    Ok(Json(LoginResponse {
        status: ResponseStatus::Success,
        message: messages::LOGIN_SUCCESS.to_string(),
        token: session.token,
        user_id: session.user.id,
        username: session.user.username,
        role: session.user.role.to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/authentication/logout",
    tag = "authentication",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session ended", body = MessageResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip_all, fields(caller = caller.user.id))]
pub async fn logout<D: Database + 'static>(
    State(state): State<AppState<D>>,
    caller: CurrentUser,
) -> Result<Json<MessageResponse>, ApiFailure> {
    state
        .users()
        .logout(&caller.token)
        .await
        .map_err(failure)?;
    info!("{}", messages::LOGOUT_SUCCESS);

    Ok(Json(MessageResponse::success(messages::LOGOUT_SUCCESS)))
}
