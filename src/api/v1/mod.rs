//! V1 API handlers.

mod authentication;
mod items;
mod users;

#[cfg(test)]
mod test_support;

use axum::Json;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::db::VersionToken;
use crate::service::{ServiceError, messages};

pub use authentication::*;
pub use items::*;
pub use users::*;

/// Outcome marker carried by every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Error")]
    pub status: ResponseStatus,
    /// Error message
    #[schema(example = "ToDo Item Not Found!")]
    pub message: String,
}

/// Success body with nothing but a message.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Success")]
    pub status: ResponseStatus,
    #[schema(example = "Share ToDo Item Successfully!")]
    pub message: String,
}

impl MessageResponse {
    pub fn success(message: &str) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.to_string(),
        }
    }
}

pub type ApiFailure = (StatusCode, Json<ErrorResponse>);

/// Map a service failure onto its HTTP status and the error envelope.
pub fn failure(error: ServiceError) -> ApiFailure {
    let code = match &error {
        ServiceError::Validation(_) | ServiceError::NoOp(_) => StatusCode::BAD_REQUEST,
        ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        ServiceError::Authorization(_) => StatusCode::FORBIDDEN,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    // Unexpected failures were already logged with their cause
    if !matches!(error, ServiceError::Unexpected(_)) {
        warn!(status = %code, message = error.message(), "Request rejected");
    }

    (
        code,
        Json(ErrorResponse {
            status: ResponseStatus::Error,
            message: error.message().to_string(),
        }),
    )
}

/// Decode a base64 version token; `None` when empty or malformed.
fn decode_version(raw: &str) -> Option<VersionToken> {
    VersionToken::from_base64(raw)
        .ok()
        .filter(|version| !version.as_bytes().is_empty())
}

/// Decode a version token that the request cannot proceed without.
fn parse_version(raw: &str) -> Result<VersionToken, ApiFailure> {
    decode_version(raw).ok_or_else(|| {
        failure(ServiceError::Validation(
            messages::INVALID_VERSION.to_string(),
        ))
    })
}
