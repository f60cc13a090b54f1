//! Mapping `tokio_postgres` errors onto [`StoreError`].

use load_core::{StoreError, StoreErrorKind};
use tokio_postgres::error::SqlState;

/// Convert a driver error, keeping the server's own message when there is one.
pub fn store_error(e: tokio_postgres::Error) -> StoreError {
    let message = e
        .as_db_error()
        .map(|db| db.message().to_string())
        .unwrap_or_else(|| e.to_string());

    let kind = if e.is_closed() {
        StoreErrorKind::Connection
    } else {
        e.code().map(kind_of).unwrap_or(StoreErrorKind::Other)
    };

    StoreError::new(kind, message)
}

fn kind_of(code: &SqlState) -> StoreErrorKind {
    if *code == SqlState::UNDEFINED_TABLE {
        StoreErrorKind::UndefinedTable
    } else if *code == SqlState::UNDEFINED_COLUMN {
        StoreErrorKind::UndefinedColumn
    } else if *code == SqlState::UNIQUE_VIOLATION
        || *code == SqlState::NOT_NULL_VIOLATION
        || *code == SqlState::CHECK_VIOLATION
        || *code == SqlState::FOREIGN_KEY_VIOLATION
    {
        StoreErrorKind::ConstraintViolation
    } else if *code == SqlState::INVALID_DATETIME_FORMAT
        || *code == SqlState::DATETIME_FIELD_OVERFLOW
        || *code == SqlState::INVALID_TEXT_REPRESENTATION
        || *code == SqlState::DATATYPE_MISMATCH
        || *code == SqlState::SYNTAX_ERROR
    {
        StoreErrorKind::InvalidValue
    } else {
        StoreErrorKind::Other
    }
}
