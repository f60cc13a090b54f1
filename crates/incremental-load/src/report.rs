//! Serializable per-load summaries.

use crate::error::LoadError;
use crate::insert::InsertResult;
use chrono::{DateTime, Utc};
use load_core::{LoadPhase, Watermark};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a load had established by the time it finished or failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadProgress {
    /// `None` until the watermark has been read.
    pub watermark: Option<Watermark>,
    pub skipped_not_newer: usize,
    pub skipped_unparseable: usize,
    pub dry_run: bool,
}

/// One load outcome, written as a single JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub source: String,
    pub table: Option<String>,
    /// Watermark read before filtering, `None` when null or never read.
    pub watermark_before: Option<String>,
    pub inserted: usize,
    pub skipped_not_newer: usize,
    pub skipped_unparseable: usize,
    pub dry_run: bool,
    /// Terminal phase on success, the failing phase otherwise.
    pub phase: LoadPhase,
    pub error: Option<String>,
    pub elapsed_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl LoadReport {
    pub fn from_outcome(
        source: &str,
        outcome: &Result<InsertResult, LoadError>,
        elapsed: Duration,
    ) -> Self {
        let elapsed_ms = elapsed.as_millis() as u64;
        match outcome {
            Ok(result) => Self {
                source: source.to_string(),
                table: Some(result.table.to_string()),
                watermark_before: result.watermark.value().map(|_| result.watermark.to_string()),
                inserted: result.inserted,
                skipped_not_newer: result.skipped_not_newer,
                skipped_unparseable: result.skipped_unparseable,
                dry_run: result.dry_run,
                phase: LoadPhase::Committed,
                error: None,
                elapsed_ms,
                finished_at: Utc::now(),
            },
            Err(e) => Self {
                source: source.to_string(),
                table: e.table().map(str::to_string),
                watermark_before: None,
                inserted: 0,
                skipped_not_newer: 0,
                skipped_unparseable: 0,
                dry_run: false,
                phase: e.phase(),
                error: Some(e.to_string()),
                elapsed_ms,
                finished_at: Utc::now(),
            },
        }
    }

    /// Fill in what the load learned before it stopped. Failures otherwise
    /// report nothing beyond the error.
    pub fn with_progress(mut self, progress: &LoadProgress) -> Self {
        self.watermark_before = progress
            .watermark
            .filter(|w| !w.is_null())
            .map(|w| w.to_string());
        self.skipped_not_newer = progress.skipped_not_newer;
        self.skipped_unparseable = progress.skipped_unparseable;
        self.dry_run = progress.dry_run;
        self
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use load_core::{parse_timestamp, Identifier, Watermark};

    #[test]
    fn test_report_from_success() {
        let mut result = InsertResult::new(Identifier::new("SHOWS").unwrap(), 3);
        result.watermark = Watermark::at(parse_timestamp("2024-01-01 00:00:00").unwrap());
        result.skipped_not_newer = 2;

        let report = LoadReport::from_outcome("shows.csv", &Ok(result), Duration::from_millis(42));
        assert!(report.succeeded());
        assert_eq!(report.table.as_deref(), Some("SHOWS"));
        assert_eq!(report.watermark_before.as_deref(), Some("2024-01-01 00:00:00"));
        assert_eq!(report.inserted, 3);
        assert_eq!(report.skipped_not_newer, 2);
        assert_eq!(report.phase, LoadPhase::Committed);
        assert_eq!(report.elapsed_ms, 42);
    }

    #[test]
    fn test_report_from_failure() {
        let err = LoadError::Insert {
            table: "SHOWS".to_string(),
            row_index: 2,
            source_row: 4,
            message: "boom".to_string(),
        };
        let report = LoadReport::from_outcome("shows.csv", &Err(err), Duration::ZERO);
        assert!(!report.succeeded());
        assert_eq!(report.phase, LoadPhase::RolledBack);
        assert_eq!(report.inserted, 0);
        assert!(report.error.unwrap().contains("row 2"));
    }

    #[test]
    fn test_failure_keeps_progress() {
        let err = LoadError::Insert {
            table: "SHOWS".to_string(),
            row_index: 0,
            source_row: 3,
            message: "boom".to_string(),
        };
        let progress = LoadProgress {
            watermark: Some(Watermark::at(parse_timestamp("2024-06-01 00:00:00").unwrap())),
            skipped_not_newer: 3,
            skipped_unparseable: 1,
            dry_run: false,
        };
        let report = LoadReport::from_outcome("shows.csv", &Err(err), Duration::ZERO)
            .with_progress(&progress);

        assert_eq!(report.phase, LoadPhase::RolledBack);
        assert_eq!(report.inserted, 0);
        assert_eq!(report.watermark_before.as_deref(), Some("2024-06-01 00:00:00"));
        assert_eq!(report.skipped_not_newer, 3);
        assert_eq!(report.skipped_unparseable, 1);

        // Nothing was learned before a provisioning failure
        let err = LoadError::Ddl {
            table: "SHOWS".to_string(),
            message: "permission denied".to_string(),
        };
        let report = LoadReport::from_outcome("shows.csv", &Err(err), Duration::ZERO)
            .with_progress(&LoadProgress::default());
        assert_eq!(report.watermark_before, None);
        assert_eq!(report.skipped_not_newer, 0);
    }

    #[test]
    fn test_json_line() {
        let result = InsertResult::new(Identifier::new("SHOWS").unwrap(), 0);
        let report = LoadReport::from_outcome("shows.csv", &Ok(result), Duration::ZERO);
        let line = report.to_json_line().unwrap();
        assert!(!line.contains('\n'));

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["phase"], "committed");
        assert_eq!(parsed["watermark_before"], serde_json::Value::Null);
        assert_eq!(parsed["source"], "shows.csv");
    }
}
