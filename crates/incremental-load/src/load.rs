//! The incremental load entry point.

use crate::error::LoadError;
use crate::filter::filter_new_rows;
use crate::insert::{load_rows, InsertResult};
use crate::provision::{derive_table_spec, ensure_table};
use crate::report::{LoadProgress, LoadReport};
use crate::watermark::read_watermark;
use load_core::{ColumnType, ColumnTypeMap, Connection, LoadPhase, Row, TableSpec, Watermark};
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument, Span};

/// Default watermark column name.
pub const DEFAULT_WATERMARK_COLUMN: &str = "AIRDATE";

/// Configuration for incremental loads.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Column whose maximum stored value is the watermark. Matched case-sensitively
    /// against the source's column names and always typed TIMESTAMP.
    pub watermark_column: String,

    /// Semantic types for the remaining columns; unlisted columns are TEXT.
    pub column_types: ColumnTypeMap,

    /// Read the watermark and filter, but issue no DDL and no inserts.
    pub dry_run: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WATERMARK_COLUMN)
    }
}

impl LoadConfig {
    pub fn new(watermark_column: impl Into<String>) -> Self {
        let watermark_column = watermark_column.into();
        let column_types =
            ColumnTypeMap::new().with(watermark_column.clone(), ColumnType::Timestamp);
        Self {
            watermark_column,
            column_types,
            dry_run: false,
        }
    }

    /// Add column types. The watermark column stays TIMESTAMP regardless.
    pub fn with_column_types(mut self, types: ColumnTypeMap) -> Self {
        self.column_types.extend(types);
        self.column_types
            .insert(self.watermark_column.clone(), ColumnType::Timestamp);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Loads decoded files into their destination tables, appending only rows
/// newer than the stored watermark.
///
/// Each [`load`](Self::load) call is independent: the table spec and watermark
/// are derived afresh and nothing is cached between calls. At most one loader
/// may write to a given table at a time.
#[derive(Debug, Clone)]
pub struct IncrementalLoader {
    config: LoadConfig,
    span: Span,
}

impl IncrementalLoader {
    pub fn new(config: LoadConfig) -> Self {
        Self {
            config,
            span: info_span!("load"),
        }
    }

    /// Run every load inside `span`. Log output is routed through whatever
    /// subscriber the caller attached to it.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Derive the destination table and locate the watermark column in it.
    pub fn table_spec(
        &self,
        source_id: &str,
        column_names: &[String],
    ) -> Result<(TableSpec, usize), LoadError> {
        let spec = derive_table_spec(source_id, column_names, &self.config.column_types)?;
        let index = spec
            .column_index(&self.config.watermark_column)
            .ok_or_else(|| LoadError::WatermarkColumnMissing {
                table: spec.name.to_string(),
                column: self.config.watermark_column.clone(),
            })?;
        Ok((spec, index))
    }

    /// Provision, read the watermark, filter and insert.
    pub async fn load<C>(
        &self,
        conn: &mut C,
        source_id: &str,
        column_names: &[String],
        rows: Vec<Row>,
    ) -> Result<InsertResult, LoadError>
    where
        C: Connection + ?Sized,
    {
        let mut progress = LoadProgress::default();
        self.run(conn, source_id, column_names, rows, &mut progress)
            .instrument(self.span.clone())
            .await
    }

    /// Like [`load`](Self::load), also returning a report that keeps the
    /// watermark and skip counts of a load that failed after filtering.
    pub async fn load_reported<C>(
        &self,
        conn: &mut C,
        source_id: &str,
        column_names: &[String],
        rows: Vec<Row>,
    ) -> (Result<InsertResult, LoadError>, LoadReport)
    where
        C: Connection + ?Sized,
    {
        let started = Instant::now();
        let mut progress = LoadProgress::default();
        let outcome = self
            .run(conn, source_id, column_names, rows, &mut progress)
            .instrument(self.span.clone())
            .await;
        let report = LoadReport::from_outcome(source_id, &outcome, started.elapsed())
            .with_progress(&progress);
        (outcome, report)
    }

    async fn run<C>(
        &self,
        conn: &mut C,
        source_id: &str,
        column_names: &[String],
        rows: Vec<Row>,
        progress: &mut LoadProgress,
    ) -> Result<InsertResult, LoadError>
    where
        C: Connection + ?Sized,
    {
        progress.dry_run = self.config.dry_run;
        debug!("{source_id}: {}", LoadPhase::Provisioning);
        let (spec, ts_index) = self.table_spec(source_id, column_names)?;
        let ts_column = spec.columns[ts_index].name.clone();

        if self.config.dry_run {
            info!("Dry run: not creating table '{}'", spec.name);
        } else {
            ensure_table(conn, &spec).await?;
        }

        debug!("{source_id}: {}", LoadPhase::WatermarkRead);
        let watermark = match read_watermark(conn, &spec.name, &ts_column).await {
            Ok(watermark) => watermark,
            Err(e) if self.config.dry_run && e.is_undefined_table() => {
                info!(
                    "Dry run: table '{}' does not exist yet; treating watermark as NULL",
                    spec.name
                );
                Watermark::null()
            }
            Err(e) => return Err(e),
        };
        progress.watermark = Some(watermark);

        debug!("{source_id}: {}", LoadPhase::Filtering);
        let total = rows.len();
        let filtered = filter_new_rows(rows, ts_index, watermark);
        progress.skipped_not_newer = filtered.skipped_not_newer;
        progress.skipped_unparseable = filtered.skipped_unparseable;
        info!(
            "{} of {total} rows from {source_id} are newer than {watermark}",
            filtered.rows.len()
        );
        if filtered.skipped_unparseable > 0 {
            warn!(
                "Excluded {} rows with an unparseable {ts_column} value",
                filtered.skipped_unparseable
            );
        }
        if filtered.kept_without_timestamp > 0 {
            warn!(
                "{} rows have no {ts_column} value and are stored as NULL; they are inserted again while {} has no watermark",
                filtered.kept_without_timestamp, spec.name
            );
        }
        if filtered.kept_unparseable > 0 {
            warn!(
                "{} rows have a {ts_column} value not in YYYY-MM-DD HH:MM:SS form; the load fails unless {} accepts them as timestamps",
                filtered.kept_unparseable, spec.name
            );
        }

        debug!("{source_id}: {}", LoadPhase::Inserting);
        let mut result = if self.config.dry_run {
            info!(
                "Dry run: would insert {} rows into '{}'",
                filtered.rows.len(),
                spec.name
            );
            let mut result = InsertResult::new(spec.name.clone(), filtered.rows.len());
            result.dry_run = true;
            result
        } else {
            load_rows(conn, &spec, &filtered.rows).await?
        };

        result.watermark = watermark;
        result.skipped_not_newer = filtered.skipped_not_newer;
        result.skipped_unparseable = filtered.skipped_unparseable;

        debug!("{source_id}: {}", LoadPhase::Committed);
        Ok(result)
    }
}
