//! Database error types.
//!
//! This module provides abstracted error types for database operations.
//! It uses miette for fancy diagnostic output and thiserror for derive macros.
//! The error types are storage-backend agnostic.

use miette::Diagnostic;
use thiserror::Error;

/// Database operation errors.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Entity not found: {entity_type} with id '{id}'")]
    #[diagnostic(code(todolist::db::not_found))]
    NotFound { entity_type: String, id: String },

    #[error("Entity already exists: {entity_type} with id '{id}'")]
    #[diagnostic(code(todolist::db::already_exists))]
    AlreadyExists { entity_type: String, id: String },

    #[error("Invalid data: {message} (hint: {help})")]
    #[diagnostic(code(todolist::db::invalid_data))]
    InvalidData { message: String, help: String },

    #[error("Database error: {message}")]
    #[diagnostic(code(todolist::db::database_error))]
    Database { message: String },

    #[error("Migration error: {message}")]
    #[diagnostic(code(todolist::db::migration_error))]
    Migration { message: String },

    #[error("Connection error: {message}")]
    #[diagnostic(code(todolist::db::connection_error))]
    Connection { message: String },
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => DbError::AlreadyExists {
                entity_type: db.table().unwrap_or("row").to_string(),
                id: db.message().to_string(),
            },
            _ => DbError::Database {
                message: e.to_string(),
            },
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
