//! Service boundary error types.
//!
//! Every service operation returns `ServiceResult<T>`. Storage failures never
//! cross this boundary as-is: they are logged and surfaced as `Unexpected`
//! with a generic message.

use std::fmt::Display;

use miette::Diagnostic;
use thiserror::Error;

use crate::db::DbError;

/// Typed failure of a service operation. The payload is the caller-facing message.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Malformed input. Nothing was read from or written to the store.
    #[error("{0}")]
    #[diagnostic(code(todolist::service::validation))]
    Validation(String),

    /// No valid session, or credentials did not match.
    #[error("{0}")]
    #[diagnostic(code(todolist::service::unauthenticated))]
    Unauthenticated(String),

    /// The caller exists but lacks rights on the record.
    #[error("{0}")]
    #[diagnostic(code(todolist::service::authorization))]
    Authorization(String),

    #[error("{0}")]
    #[diagnostic(code(todolist::service::not_found))]
    NotFound(String),

    /// The request would not change any persisted state.
    #[error("{0}")]
    #[diagnostic(
        code(todolist::service::no_op),
        help("Change at least one field, tag or share before resubmitting")
    )]
    NoOp(String),

    /// The record changed since the caller read it.
    #[error("{0}")]
    #[diagnostic(
        code(todolist::service::conflict),
        help("Fetch the record again and resubmit with its current version")
    )]
    Conflict(String),

    #[error("{0}")]
    #[diagnostic(code(todolist::service::unexpected))]
    Unexpected(String),
}

impl ServiceError {
    /// The caller-facing message.
    pub fn message(&self) -> &str {
        match self {
            ServiceError::Validation(m)
            | ServiceError::Unauthenticated(m)
            | ServiceError::Authorization(m)
            | ServiceError::NotFound(m)
            | ServiceError::NoOp(m)
            | ServiceError::Conflict(m)
            | ServiceError::Unexpected(m) => m,
        }
    }

    /// Log `cause` and hide it behind a generic message.
    pub(crate) fn unexpected(message: &str, cause: impl Display) -> Self {
        tracing::error!(error = %cause, "{}", message);
        ServiceError::Unexpected(message.to_string())
    }

    /// A missing row becomes `NotFound(missing)`; any other storage failure is unexpected.
    pub(crate) fn lookup(error: DbError, missing: &str, failed: &str) -> Self {
        match error {
            DbError::NotFound { .. } => ServiceError::NotFound(missing.to_string()),
            other => ServiceError::unexpected(failed, other),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
