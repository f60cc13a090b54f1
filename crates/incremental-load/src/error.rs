//! Error types for incremental loads.

use load_core::{IdentifierError, LoadPhase, StoreErrorKind};
use thiserror::Error;

/// A failed load. Every variant leaves the destination table either unchanged
/// or, for DDL, with at most an empty newly created table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// A table or column name derived from the source is not a safe identifier.
    #[error("Invalid identifier derived from '{origin}': {error}")]
    InvalidIdentifier {
        origin: String,
        #[source]
        error: IdentifierError,
    },

    /// The configured watermark column is not one of the source's columns.
    #[error("Watermark column '{column}' is not a column of {table}")]
    WatermarkColumnMissing { table: String, column: String },

    /// `CREATE TABLE IF NOT EXISTS` failed at the store.
    #[error("Failed to create table {table}: {message}")]
    Ddl { table: String, message: String },

    /// `SELECT MAX(...)` failed at the store.
    #[error("Failed to read watermark from {table}: {message}")]
    WatermarkRead {
        table: String,
        kind: StoreErrorKind,
        message: String,
    },

    /// A row insert failed; the whole transaction was rolled back.
    #[error("Failed to insert row {row_index} (source row {source_row}) into {table}: {message}")]
    Insert {
        table: String,
        /// Zero-based position within the filtered rows.
        row_index: usize,
        /// Zero-based position within the source file.
        source_row: usize,
        message: String,
    },

    /// The insert transaction could not be started; nothing was written.
    #[error("Failed to start transaction on {table}: {message}")]
    Begin { table: String, message: String },

    /// The insert transaction failed to commit.
    #[error("Transaction on {table} failed: {message}")]
    Transaction { table: String, message: String },
}

impl LoadError {
    /// The phase the load was in when it failed.
    pub fn phase(&self) -> LoadPhase {
        match self {
            LoadError::InvalidIdentifier { .. }
            | LoadError::WatermarkColumnMissing { .. }
            | LoadError::Ddl { .. } => LoadPhase::Provisioning,
            LoadError::WatermarkRead { .. } => LoadPhase::WatermarkRead,
            LoadError::Begin { .. } => LoadPhase::Inserting,
            LoadError::Insert { .. } | LoadError::Transaction { .. } => LoadPhase::RolledBack,
        }
    }

    /// Destination table the error refers to, when one had been derived.
    pub fn table(&self) -> Option<&str> {
        match self {
            LoadError::InvalidIdentifier { .. } => None,
            LoadError::WatermarkColumnMissing { table, .. }
            | LoadError::Ddl { table, .. }
            | LoadError::WatermarkRead { table, .. }
            | LoadError::Begin { table, .. }
            | LoadError::Insert { table, .. }
            | LoadError::Transaction { table, .. } => Some(table),
        }
    }

    /// True when the watermark read failed only because the table does not exist yet.
    pub fn is_undefined_table(&self) -> bool {
        matches!(
            self,
            LoadError::WatermarkRead {
                kind: StoreErrorKind::UndefinedTable,
                ..
            }
        )
    }
}
