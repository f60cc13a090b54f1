//! Running loads and plans over resolved CSV sources.

use crate::report::ReportWriter;
use anyhow::{Context, Result};
use load_core::{sql, Connection};
use std::path::{Path, PathBuf};
use tidemark_csv_source::{read_table, FileSource};
use tidemark_incremental_load::{IncrementalLoader, LoadConfig, LoadReport};
use tracing::{error, info, info_span};

/// Resolve every source in order, expanding directories.
pub async fn resolve_sources(sources: &[FileSource]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for source in sources {
        let resolved = source
            .resolve()
            .await
            .with_context(|| format!("Failed to resolve source {}", source.display_name()))?;
        if resolved.is_empty() {
            info!("No CSV files found in {}", source.display_name());
        }
        paths.extend(resolved);
    }
    Ok(paths)
}

/// Outcome of a run across several files.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<LoadReport>,
}

impl RunSummary {
    pub fn total_inserted(&self) -> usize {
        self.reports.iter().map(|r| r.inserted).sum()
    }
}

/// Load each file in turn on one connection.
///
/// Stops at the first failed load; its report is still written before the
/// error is returned.
pub async fn load_sources<C>(
    conn: &mut C,
    config: &LoadConfig,
    paths: &[PathBuf],
    delimiter: u8,
    mut reports: Option<&mut ReportWriter>,
) -> Result<RunSummary>
where
    C: Connection + ?Sized,
{
    let mut summary = RunSummary::default();

    for path in paths {
        let table = read_table(path, delimiter).await?;
        let source_id = table.source_id.clone();
        let loader = IncrementalLoader::new(config.clone())
            .with_span(info_span!("load", source = %source_id));

        let (outcome, report) = loader
            .load_reported(&mut *conn, &source_id, &table.columns, table.rows)
            .await;

        if let Some(writer) = reports.as_deref_mut() {
            writer.append(&report).await.with_context(|| {
                format!("Failed to write report to {}", writer.path().display())
            })?;
        }

        match outcome {
            Ok(result) => {
                if result.dry_run {
                    info!(
                        "Dry run: {} rows from {source_id} would be inserted into {}",
                        result.inserted, result.table
                    );
                } else {
                    info!(
                        "Inserted {} rows from {source_id} into {}",
                        result.inserted, result.table
                    );
                }
                summary.reports.push(report);
            }
            Err(e) => {
                error!("Load of {source_id} failed in phase {}: {e}", e.phase());
                return Err(e).with_context(|| format!("Failed to load {source_id}"));
            }
        }
    }

    Ok(summary)
}

/// What a load of one file would do, derived without a connection.
#[derive(Debug, Clone)]
pub struct TablePlan {
    pub source: String,
    pub table: String,
    pub create_table: String,
    pub watermark_query: String,
    pub rows: usize,
}

pub async fn plan_source(path: &Path, config: &LoadConfig, delimiter: u8) -> Result<TablePlan> {
    let table = read_table(path, delimiter).await?;
    let loader = IncrementalLoader::new(config.clone());
    let (spec, ts_index) = loader
        .table_spec(&table.source_id, &table.columns)
        .with_context(|| format!("Failed to plan {}", table.source_id))?;

    Ok(TablePlan {
        source: table.source_id.clone(),
        table: spec.name.to_string(),
        create_table: sql::create_table(&spec),
        watermark_query: sql::max_value(&spec.name, &spec.columns[ts_index].name),
        rows: table.rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plan_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shows.csv");
        std::fs::write(&path, "TITLE,AIRDATE\nPilot,2024-01-01 20:00:00\n").unwrap();

        let plan = plan_source(&path, &LoadConfig::new("AIRDATE"), b',')
            .await
            .unwrap();

        assert_eq!(plan.table, "SHOWS");
        assert_eq!(
            plan.create_table,
            "CREATE TABLE IF NOT EXISTS SHOWS (TITLE TEXT, AIRDATE TIMESTAMP);"
        );
        assert_eq!(plan.watermark_query, "SELECT MAX(AIRDATE) FROM SHOWS");
        assert_eq!(plan.rows, 1);
    }

    #[tokio::test]
    async fn test_plan_source_missing_watermark_column() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shows.csv");
        std::fs::write(&path, "TITLE,PREMIERED\nPilot,2024-01-01 20:00:00\n").unwrap();

        let err = plan_source(&path, &LoadConfig::new("AIRDATE"), b',')
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("AIRDATE"));
    }
}
