//! CSV sources for tidemark
//!
//! Resolves command-line sources into concrete `.csv` files and decodes each
//! one into a [`DecodedTable`]: the header row as column names plus every
//! record as a positional [`Row`](load_core::Row) of text values.
//!
//! # Directory Detection
//!
//! A source is treated as a directory if it ends with `/`. Directories are
//! listed non-recursively and only files with a `csv` extension are kept.
//!
//! # Example
//!
//! ```ignore
//! use tidemark_csv_source::{read_table, FileSource};
//!
//! let source = FileSource::parse("/data/exports/");
//! for path in source.resolve().await? {
//!     let table = read_table(&path, b',').await?;
//!     // Hand table.columns and table.rows to the loader...
//! }
//! ```

mod decode;
mod source;

pub use decode::{decode, read_table, DecodedTable};
pub use source::{list_csv_files, FileSource};
