//! Bearer session extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::state::AppState;
use super::v1::{ApiFailure, failure};
use crate::db::{Database, User};
use crate::service::{ServiceError, messages};

/// The authenticated caller, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<D: Database + 'static> FromRequestParts<AppState<D>> for CurrentUser {
    type Rejection = ApiFailure;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<D>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            failure(ServiceError::Unauthenticated(
                messages::NOT_AUTHENTICATED.to_string(),
            ))
        })?;

        let user = state.users().authenticate(token).await.map_err(failure)?;

        Ok(CurrentUser {
            user,
            token: token.to_string(),
        })
    }
}
