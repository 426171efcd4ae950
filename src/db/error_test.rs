//! Tests for database error types.

use crate::db::{DbError, DbResult};

#[test]
fn not_found_error_displays_correctly() {
    let err = DbError::NotFound {
        entity_type: "Item".to_string(),
        id: "42".to_string(),
    };
    assert_eq!(err.to_string(), "Entity not found: Item with id '42'");
}

#[test]
fn already_exists_error_displays_correctly() {
    let err = DbError::AlreadyExists {
        entity_type: "User".to_string(),
        id: "ann@example.com".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Entity already exists: User with id 'ann@example.com'"
    );
}

#[test]
fn invalid_data_error_includes_hint() {
    let err = DbError::InvalidData {
        message: "bad due date".to_string(),
        help: "use YYYY-MM-DD HH:MM:SS".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Invalid data: bad due date (hint: use YYYY-MM-DD HH:MM:SS)"
    );
}

#[test]
fn migration_error_displays_correctly() {
    let err = DbError::Migration {
        message: "failed to apply migration 20250101000000".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Migration error: failed to apply migration 20250101000000"
    );
}

#[test]
fn sqlx_row_not_found_maps_to_database_error() {
    let err: DbError = sqlx::Error::RowNotFound.into();
    assert!(matches!(err, DbError::Database { .. }));
}

#[test]
fn db_result_propagates_with_question_mark() {
    fn inner() -> DbResult<()> {
        Err(DbError::Connection {
            message: "unable to open database".to_string(),
        })
    }

    fn outer() -> DbResult<u8> {
        inner()?;
        Ok(1)
    }

    assert!(matches!(outer(), Err(DbError::Connection { .. })));
}
