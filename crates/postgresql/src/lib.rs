//! PostgreSQL store for tidemark incremental loads
//!
//! Implements the `load-core` [`Connection`](load_core::Connection) seam over
//! `tokio-postgres`. Row values are always bound as statement parameters;
//! only validated identifiers are interpolated into SQL text.

mod connection;
mod error;
mod opts;
mod params;

pub use connection::{PostgresConnection, PostgresTransaction};
pub use error::store_error;
pub use opts::PostgresOpts;
