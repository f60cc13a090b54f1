//! Watermark-based incremental loads.
//!
//! A load takes one decoded source file and appends only the rows newer than
//! what the destination table already holds:
//!
//! ```text
//! derive_table_spec → ensure_table → read_watermark → filter_new_rows → load_rows
//! ```
//!
//! Re-running a load with the same input is safe: rows at or before the
//! watermark are dropped, and a failed insert rolls back in full, so the table
//! only ever holds its prior contents or its prior contents plus every
//! filtered row.
//!
//! # Example
//!
//! ```ignore
//! let loader = IncrementalLoader::new(LoadConfig::new("AIRDATE"));
//! let result = loader
//!     .load(&mut conn, "shows.csv", &table.columns, table.rows)
//!     .await?;
//! println!("inserted {}", result.inserted);
//! ```

mod error;
mod filter;
mod insert;
mod load;
mod provision;
mod report;
mod watermark;

pub use error::LoadError;
pub use filter::{filter_new_rows, FilteredRows};
pub use insert::{load_rows, InsertResult};
pub use load::{IncrementalLoader, LoadConfig, DEFAULT_WATERMARK_COLUMN};
pub use provision::{derive_table_name, derive_table_spec, ensure_table};
pub use report::{LoadProgress, LoadReport};
pub use watermark::read_watermark;
