//! Transactional insert of filtered rows.

use crate::error::LoadError;
use load_core::{Connection, Identifier, Row, StoreError, StoreErrorKind, TableSpec, Watermark};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Outcome of a successful load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertResult {
    /// Destination table.
    pub table: Identifier,
    /// Watermark observed before filtering.
    pub watermark: Watermark,
    /// Rows committed (or, in a dry run, rows that would have been).
    pub inserted: usize,
    /// Rows at or before the watermark.
    pub skipped_not_newer: usize,
    /// Rows excluded because their watermark value could not be parsed.
    pub skipped_unparseable: usize,
    pub dry_run: bool,
}

impl InsertResult {
    pub fn new(table: Identifier, inserted: usize) -> Self {
        Self {
            table,
            watermark: Watermark::null(),
            inserted,
            skipped_not_newer: 0,
            skipped_unparseable: 0,
            dry_run: false,
        }
    }
}

/// Insert `rows` into `spec.name` inside a single transaction.
///
/// An empty `rows` returns immediately without opening a transaction. The first
/// failing row aborts the rest and rolls back everything inserted so far.
pub async fn load_rows<C>(
    conn: &mut C,
    spec: &TableSpec,
    rows: &[Row],
) -> Result<InsertResult, LoadError>
where
    C: Connection + ?Sized,
{
    if rows.is_empty() {
        info!("No new records to insert.");
        return Ok(InsertResult::new(spec.name.clone(), 0));
    }

    let table = spec.name.to_string();
    debug!(
        "Insert statement: {}",
        load_core::sql::insert_row(&spec.name, spec.arity())
    );

    let mut tx = conn.begin().await.map_err(|e| LoadError::Begin {
        table: table.clone(),
        message: e.message,
    })?;

    for (index, row) in rows.iter().enumerate() {
        let outcome = if row.len() != spec.arity() {
            Err(StoreError::new(
                StoreErrorKind::InvalidValue,
                format!(
                    "row has {} values but {} has {} columns",
                    row.len(),
                    spec.name,
                    spec.arity()
                ),
            ))
        } else {
            tx.insert_row(spec, row).await
        };

        if let Err(e) = outcome {
            warn!(
                "Error inserting row {index} (source row {}) into {table}: {e}",
                row.position
            );
            if let Err(rollback) = tx.rollback().await {
                error!("Rollback on {table} failed: {rollback}");
            }
            return Err(LoadError::Insert {
                table,
                row_index: index,
                source_row: row.position,
                message: e.message,
            });
        }
    }

    tx.commit().await.map_err(|e| LoadError::Transaction {
        table: table.clone(),
        message: e.message,
    })?;

    info!("Inserted {} new rows into '{table}'.", rows.len());
    Ok(InsertResult::new(spec.name.clone(), rows.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use load_core::{ColumnSpec, ColumnType, LoadPhase, MemoryStore};

    fn ident(name: &str) -> Identifier {
        Identifier::new(name).unwrap()
    }

    fn spec() -> TableSpec {
        TableSpec::new(
            ident("SHOWS"),
            vec![
                ColumnSpec::new(ident("TITLE"), ColumnType::Text),
                ColumnSpec::new(ident("AIRDATE"), ColumnType::Timestamp),
            ],
        )
    }

    fn row(position: usize, title: &str, airdate: &str) -> Row {
        Row::new(position, vec![title.to_string(), airdate.to_string()])
    }

    #[tokio::test]
    async fn test_empty_rows_skip_transaction() {
        let mut store = MemoryStore::new();
        let result = load_rows(&mut store, &spec(), &[]).await.unwrap();

        assert_eq!(result.inserted, 0);
        assert!(store.statements().is_empty());
    }

    #[tokio::test]
    async fn test_commits_once() {
        let mut store = MemoryStore::new();
        store.create_table(&spec()).await.unwrap();
        store.clear_statements();

        let rows = vec![
            row(0, "a", "2024-01-01 00:00:00"),
            row(1, "b", "2024-01-02 00:00:00"),
        ];
        let result = load_rows(&mut store, &spec(), &rows).await.unwrap();

        assert_eq!(result.inserted, 2);
        assert_eq!(store.row_count("SHOWS"), 2);
        assert_eq!(
            store.statements(),
            &[
                "BEGIN".to_string(),
                "INSERT INTO SHOWS VALUES ($1, $2)".to_string(),
                "INSERT INTO SHOWS VALUES ($1, $2)".to_string(),
                "COMMIT".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_rolls_back_everything() {
        let mut store = MemoryStore::new();
        store.create_table(&spec()).await.unwrap();
        store.clear_statements();

        let rows = vec![
            row(4, "a", "2024-01-01 00:00:00"),
            row(5, "b", "not a time"),
            row(6, "c", "2024-01-03 00:00:00"),
        ];
        let err = load_rows(&mut store, &spec(), &rows).await.unwrap_err();

        match err {
            LoadError::Insert {
                row_index,
                source_row,
                ref message,
                ..
            } => {
                assert_eq!(row_index, 1);
                assert_eq!(source_row, 5);
                assert!(message.contains("invalid input syntax for type timestamp"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.row_count("SHOWS"), 0);
        assert_eq!(store.statements().last().map(String::as_str), Some("ROLLBACK"));
        assert_eq!(store.statements().len(), 4);
    }

    #[tokio::test]
    async fn test_begin_failure_is_not_a_rollback() {
        let mut store = MemoryStore::new();
        store.create_table(&spec()).await.unwrap();
        store.fail_begin("connection reset by peer");

        let rows = vec![row(0, "a", "2024-01-01 00:00:00")];
        let err = load_rows(&mut store, &spec(), &rows).await.unwrap_err();

        assert!(matches!(err, LoadError::Begin { ref message, .. } if message.contains("reset")));
        assert_eq!(err.phase(), LoadPhase::Inserting);
        assert_eq!(store.row_count("SHOWS"), 0);
        assert!(!store.statements().iter().any(|s| s == "ROLLBACK"));
    }

    #[tokio::test]
    async fn test_arity_mismatch_is_insert_error() {
        let mut store = MemoryStore::new();
        store.create_table(&spec()).await.unwrap();

        let rows = vec![
            row(0, "a", "2024-01-01 00:00:00"),
            Row::new(1, vec!["only one".to_string()]),
        ];
        let err = load_rows(&mut store, &spec(), &rows).await.unwrap_err();
        assert!(matches!(err, LoadError::Insert { row_index: 1, .. }));
        assert_eq!(store.row_count("SHOWS"), 0);
    }
}
