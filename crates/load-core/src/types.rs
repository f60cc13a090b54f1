//! Destination schema, row and watermark types.

use crate::identifier::Identifier;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic type of a destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Timestamp,
    #[default]
    Text,
}

impl ColumnType {
    /// The SQL type name used in `CREATE TABLE`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Text => "TEXT",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "timestamp" => Ok(ColumnType::Timestamp),
            "text" => Ok(ColumnType::Text),
            other => Err(format!(
                "unknown column type '{other}', expected 'timestamp' or 'text'"
            )),
        }
    }
}

/// A single destination column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: Identifier,
    pub sql_type: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: Identifier, sql_type: ColumnType) -> Self {
        Self { name, sql_type }
    }
}

/// Destination table derived from a source file.
///
/// Column order is the source file's column order; rows are bound positionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSpec {
    pub name: Identifier,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    pub fn new(name: Identifier, columns: Vec<ColumnSpec>) -> Self {
        Self { name, columns }
    }

    /// Position of the column with exactly this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name.as_str() == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn arity(&self) -> usize {
        self.columns.len()
    }
}

/// One decoded record, values kept in their original text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Zero-based position of the record in its source file.
    pub position: usize,
    pub values: Vec<String>,
}

impl Row {
    pub fn new(position: usize, values: Vec<String>) -> Self {
        Self { position, values }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Value to bind for a raw cell. Empty cells are stored as NULL.
pub fn bind_value(raw: &str) -> Option<&str> {
    if raw.is_empty() {
        None
    } else {
        Some(raw)
    }
}

/// Maximum watermark-column value currently stored. `None` means load everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Watermark(Option<NaiveDateTime>);

impl Watermark {
    pub fn null() -> Self {
        Self(None)
    }

    pub fn at(value: NaiveDateTime) -> Self {
        Self(Some(value))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn value(&self) -> Option<NaiveDateTime> {
        self.0
    }

    /// Whether a row stamped `ts` is strictly newer than this watermark.
    pub fn admits(&self, ts: &NaiveDateTime) -> bool {
        match &self.0 {
            Some(mark) => ts > mark,
            None => true,
        }
    }
}

impl From<Option<NaiveDateTime>> for Watermark {
    fn from(value: Option<NaiveDateTime>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            None => f.write_str("NULL"),
        }
    }
}
