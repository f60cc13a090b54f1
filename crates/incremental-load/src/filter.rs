//! Watermark filtering of incoming rows.

use load_core::{parse_timestamp, Row, Watermark};
use tracing::debug;

/// Rows eligible for insertion, plus what was dropped and why.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredRows {
    /// Rows strictly newer than the watermark, in their original order.
    pub rows: Vec<Row>,
    /// Rows with a parseable timestamp at or before the watermark.
    pub skipped_not_newer: usize,
    /// Rows dropped because their timestamp could not be parsed.
    pub skipped_unparseable: usize,
    /// Rows kept under a null watermark with an empty or missing timestamp.
    pub kept_without_timestamp: usize,
    /// Rows kept under a null watermark whose timestamp is not in the filter format.
    pub kept_unparseable: usize,
}

/// Keep rows whose value at `column` is strictly newer than `watermark`.
///
/// A null watermark keeps every row unmodified. Otherwise rows with a missing
/// or unparseable timestamp are dropped, since they cannot be shown to be new.
pub fn filter_new_rows(rows: Vec<Row>, column: usize, watermark: Watermark) -> FilteredRows {
    let mut filtered = FilteredRows::default();

    let Some(mark) = watermark.value() else {
        for row in &rows {
            match row.get(column) {
                None | Some("") => filtered.kept_without_timestamp += 1,
                Some(v) if parse_timestamp(v).is_err() => filtered.kept_unparseable += 1,
                Some(_) => {}
            }
        }
        filtered.rows = rows;
        return filtered;
    };

    let mut skipped_not_newer = 0;
    let mut skipped_unparseable = 0;
    filtered.rows = rows
        .into_iter()
        .filter(|row| match row.get(column).map(parse_timestamp) {
            Some(Ok(ts)) if ts > mark => true,
            Some(Ok(_)) => {
                skipped_not_newer += 1;
                false
            }
            Some(Err(e)) => {
                debug!("Excluding source row {}: {e}", row.position);
                skipped_unparseable += 1;
                false
            }
            None => {
                debug!("Excluding source row {}: no watermark value", row.position);
                skipped_unparseable += 1;
                false
            }
        })
        .collect();
    filtered.skipped_not_newer = skipped_not_newer;
    filtered.skipped_unparseable = skipped_unparseable;

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(stamps: &[&str]) -> Vec<Row> {
        stamps
            .iter()
            .enumerate()
            .map(|(i, ts)| Row::new(i, vec![format!("title {i}"), ts.to_string()]))
            .collect()
    }

    fn mark(ts: &str) -> Watermark {
        Watermark::at(parse_timestamp(ts).unwrap())
    }

    #[test]
    fn test_null_watermark_keeps_everything() {
        let input = rows(&["2024-01-01 00:00:00", "garbage", ""]);
        let filtered = filter_new_rows(input.clone(), 1, Watermark::null());

        assert_eq!(filtered.rows, input);
        assert_eq!(filtered.skipped_not_newer, 0);
        assert_eq!(filtered.skipped_unparseable, 0);
        assert_eq!(filtered.kept_without_timestamp, 1);
        assert_eq!(filtered.kept_unparseable, 1);
    }

    #[test]
    fn test_null_watermark_counts_short_rows_as_missing() {
        let input = vec![
            Row::new(0, vec!["only title".to_string()]),
            Row::new(1, vec!["dated".to_string(), "2024-01-02".to_string()]),
        ];
        let filtered = filter_new_rows(input, 1, Watermark::null());

        assert_eq!(filtered.rows.len(), 2);
        assert_eq!(filtered.kept_without_timestamp, 1);
        assert_eq!(filtered.kept_unparseable, 1);
    }

    #[test]
    fn test_strictly_newer_only() {
        let input = rows(&[
            "2024-01-01 11:59:59",
            "2024-01-01 12:00:00",
            "2024-01-01 12:00:01",
        ]);
        let filtered = filter_new_rows(input, 1, mark("2024-01-01 12:00:00"));

        assert_eq!(filtered.rows.len(), 1);
        assert_eq!(filtered.rows[0].position, 2);
        assert_eq!(filtered.skipped_not_newer, 2);
    }

    #[test]
    fn test_unparseable_dropped_under_watermark() {
        let input = rows(&["2025-01-01 00:00:00", "2025/01/02", "", "2025-01-03 00:00:00"]);
        let filtered = filter_new_rows(input, 1, mark("2024-01-01 00:00:00"));

        let kept: Vec<_> = filtered.rows.iter().map(|r| r.position).collect();
        assert_eq!(kept, vec![0, 3]);
        assert_eq!(filtered.skipped_unparseable, 2);
    }

    #[test]
    fn test_short_row_treated_as_missing() {
        let input = vec![Row::new(0, vec!["only title".to_string()])];
        let filtered = filter_new_rows(input, 1, mark("2024-01-01 00:00:00"));
        assert!(filtered.rows.is_empty());
        assert_eq!(filtered.skipped_unparseable, 1);
    }

    #[test]
    fn test_order_preserved() {
        let input = rows(&[
            "2025-03-01 00:00:00",
            "2025-01-01 00:00:00",
            "2020-01-01 00:00:00",
            "2025-02-01 00:00:00",
        ]);
        let filtered = filter_new_rows(input, 1, mark("2024-01-01 00:00:00"));
        let kept: Vec<_> = filtered.rows.iter().map(|r| r.position).collect();
        assert_eq!(kept, vec![0, 1, 3]);
    }
}
