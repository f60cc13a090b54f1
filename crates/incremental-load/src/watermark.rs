//! Reading the current high-water mark from the destination table.

use crate::error::LoadError;
use load_core::{Connection, Identifier, Watermark};
use tracing::{debug, info};

/// Read `MAX(<column>)` from `table`.
///
/// A null aggregate (empty table or only NULLs) is a null watermark. Query
/// failures are returned, never swallowed; the table is expected to have been
/// provisioned already.
pub async fn read_watermark<C>(
    conn: &mut C,
    table: &Identifier,
    column: &Identifier,
) -> Result<Watermark, LoadError>
where
    C: Connection + ?Sized,
{
    debug!("Watermark query: {}", load_core::sql::max_value(table, column));

    let watermark = conn
        .max_timestamp(table, column)
        .await
        .map_err(|e| LoadError::WatermarkRead {
            table: table.to_string(),
            kind: e.kind,
            message: e.message,
        })?;

    if watermark.is_null() {
        info!("No existing data in {table}, inserting all rows.");
    } else {
        info!("Max {column} in {table}: {watermark}");
    }

    Ok(watermark)
}
