//! Caller-supplied column type mapping.
//!
//! Columns not listed in the map are `TEXT`. The map can be built in code or
//! loaded from YAML:
//!
//! ```yaml
//! columns:
//!   AIRDATE: timestamp
//!   RELEASE_DATE: text
//! ```

use crate::types::ColumnType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a column type mapping.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Error reading the mapping file
    #[error("Failed to read column type file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Column name to semantic type. Lookups are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeMap {
    #[serde(default)]
    columns: BTreeMap<String, ColumnType>,
}

impl ColumnTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a mapping from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a mapping from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn with(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        self.insert(column, column_type);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, column_type: ColumnType) {
        self.columns.insert(column.into(), column_type);
    }

    /// Merge `other` into this map; entries in `other` win.
    pub fn extend(&mut self, other: ColumnTypeMap) {
        self.columns.extend(other.columns);
    }

    pub fn type_of(&self, column: &str) -> ColumnType {
        self.columns.get(column).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
