//! Tidemark Library
//!
//! Incrementally loads CSV exports into PostgreSQL tables. Each file becomes
//! a table named after its stem; each run appends only the rows whose
//! watermark column is newer than the table's current maximum.
//!
//! # Crates
//!
//! - `load_core` - identifiers, table specs, rows, watermarks and the store seam
//! - `tidemark_incremental_load` - provisioning, watermark read, filtering and insert
//! - `tidemark_postgresql` - the PostgreSQL store
//! - `tidemark_csv_source` - resolving and decoding CSV files
//!
//! # CLI Usage
//!
//! ```bash
//! # Load two exports, appending only new episodes
//! tidemark load shows.csv exports/ --watermark-column AIRDATE
//!
//! # Show the statements a load would issue, without connecting
//! tidemark plan shows.csv
//! ```

pub mod column_types;
pub mod pipeline;
pub mod report;

pub use column_types::{build_column_types, delimiter_byte, parse_column_type};
pub use pipeline::{load_sources, plan_source, resolve_sources, RunSummary, TablePlan};
pub use report::ReportWriter;

// Re-export member crates for convenience
pub use tidemark_csv_source as csv;
pub use tidemark_incremental_load as incremental;
pub use tidemark_postgresql as postgresql;
