//! Core types for tidemark incremental loads.
//!
//! This crate provides the foundational types shared by the loader, the
//! PostgreSQL store and the CSV source:
//!
//! - [`Identifier`] - Validated table/column names safe to interpolate into SQL
//! - [`TableSpec`] / [`ColumnSpec`] / [`ColumnType`] - Derived destination schema
//! - [`ColumnTypeMap`] - Caller-supplied column name to semantic type mapping
//! - [`Row`] / [`Watermark`] - Incoming records and the persisted high-water mark
//! - [`Connection`] / [`Transaction`] - The store seam the loader is written against
//! - [`MemoryStore`] - In-process store implementing the seam
//!
//! # Architecture
//!
//! ```text
//! load-core (this crate)
//!    │
//!    ├─── tidemark-csv-source        (decodes files into Rows)
//!    ├─── tidemark-incremental-load  (provisioning, watermark, filter, insert)
//!    └─── tidemark-postgresql        (implements Connection/Transaction)
//! ```

pub mod identifier;
pub mod memory;
pub mod phase;
pub mod schema;
pub mod sql;
pub mod store;
pub mod timestamp;
pub mod types;

pub use identifier::{Identifier, IdentifierError, MAX_IDENTIFIER_LEN};
pub use memory::{MemoryStore, MemoryTable};
pub use phase::LoadPhase;
pub use schema::{ColumnTypeMap, SchemaError};
pub use store::{Connection, StoreError, StoreErrorKind, Transaction};
pub use timestamp::{parse_stored_timestamp, parse_timestamp, TimestampParseError, TIMESTAMP_FORMAT};
pub use types::{bind_value, ColumnSpec, ColumnType, Row, TableSpec, Watermark};
