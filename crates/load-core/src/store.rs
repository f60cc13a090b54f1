//! Store connection trait and error types
//!
//! The loader is written against [`Connection`] and [`Transaction`] so the same
//! provisioning, watermark and insert logic works with:
//! - PostgreSQL (`PostgresConnection` in tidemark-postgresql)
//! - The in-process [`MemoryStore`](crate::MemoryStore)

use crate::identifier::Identifier;
use crate::types::{Row, TableSpec, Watermark};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Broad classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The addressed table does not exist.
    UndefinedTable,
    /// The addressed column does not exist.
    UndefinedColumn,
    /// A value was rejected for its column type, or the row shape was wrong.
    InvalidValue,
    /// A constraint (unique, not null, ...) was violated.
    ConstraintViolation,
    /// The connection itself failed.
    Connection,
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreErrorKind::UndefinedTable => "undefined table",
            StoreErrorKind::UndefinedColumn => "undefined column",
            StoreErrorKind::InvalidValue => "invalid value",
            StoreErrorKind::ConstraintViolation => "constraint violation",
            StoreErrorKind::Connection => "connection",
            StoreErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// An error reported by the store, carrying its message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn undefined_table(table: &str) -> Self {
        Self::new(
            StoreErrorKind::UndefinedTable,
            format!("relation \"{}\" does not exist", table.to_ascii_lowercase()),
        )
    }

    pub fn is_undefined_table(&self) -> bool {
        self.kind == StoreErrorKind::UndefinedTable
    }
}

/// A connection to the destination store.
///
/// Callers own the connection lifecycle: open it before a load, close it after.
#[async_trait]
pub trait Connection: Send {
    /// Issue `CREATE TABLE IF NOT EXISTS` for `spec`.
    ///
    /// On failure any partial transactional state on the connection must be
    /// rolled back before the error is returned.
    async fn create_table(&mut self, spec: &TableSpec) -> Result<(), StoreError>;

    /// Issue `SELECT MAX(<column>) FROM <table>` and decode the result.
    ///
    /// An empty table, or a column holding only NULLs, yields a null watermark.
    async fn max_timestamp(
        &mut self,
        table: &Identifier,
        column: &Identifier,
    ) -> Result<Watermark, StoreError>;

    /// Start a transaction. Dropping it without committing discards its writes.
    async fn begin<'a>(&'a mut self) -> Result<Box<dyn Transaction + 'a>, StoreError>;
}

/// A transaction scope for row inserts.
#[async_trait]
pub trait Transaction: Send {
    /// Execute `INSERT INTO <table> VALUES (...)` binding `row` positionally
    /// against `spec.columns`.
    async fn insert_row(&mut self, spec: &TableSpec, row: &Row) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
