//! Decoding CSV content into positional rows

use anyhow::{Context, Result};
use load_core::Row;
use std::path::Path;
use tracing::{debug, info};

/// A decoded CSV file: header names plus text rows in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTable {
    /// Identifies the file the rows came from; the table name derives from it.
    pub source_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Decode CSV data whose first record is the header row.
///
/// Every record must have as many fields as the header. Values are kept
/// verbatim, so an empty field stays an empty string.
pub fn decode<R: std::io::Read>(reader: R, source_id: &str, delimiter: u8) -> Result<DecodedTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let columns = csv_reader
        .headers()
        .with_context(|| format!("Failed to read CSV headers from {source_id}"))?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<String>>();
    debug!("CSV headers/columns: {columns:?}");

    let mut rows = Vec::new();
    for (position, result) in csv_reader.records().enumerate() {
        let record = result
            .with_context(|| format!("Failed to read CSV record {} of {source_id}", position + 1))?;

        if record.len() != columns.len() {
            anyhow::bail!(
                "Column count mismatch in CSV row {} of {source_id}: expected {} columns ({}), but found {} columns",
                position + 1,
                columns.len(),
                columns.join(", "),
                record.len()
            );
        }

        rows.push(Row::new(
            position,
            record.iter().map(|v| v.to_string()).collect(),
        ));
    }

    info!("Decoded {} records from {source_id}", rows.len());
    Ok(DecodedTable {
        source_id: source_id.to_string(),
        columns,
        rows,
    })
}

/// Read and decode one local CSV file.
pub async fn read_table(path: &Path, delimiter: u8) -> Result<DecodedTable> {
    // Read the entire file into memory; the loader needs every row before it filters.
    let contents = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    decode(
        std::io::Cursor::new(contents),
        &path.display().to_string(),
        delimiter,
    )
}
