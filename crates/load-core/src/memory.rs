//! In-process store implementation.
//!
//! [`MemoryStore`] implements [`Connection`] with the store semantics the loader
//! relies on: idempotent `CREATE TABLE IF NOT EXISTS`, case-insensitive
//! unquoted identifiers, `MAX` over the watermark column, TIMESTAMP columns
//! rejecting malformed values, optional UNIQUE constraints, and transactional
//! staging with commit/rollback. Every statement issued is recorded.

use crate::identifier::Identifier;
use crate::sql;
use crate::store::{Connection, StoreError, StoreErrorKind, Transaction};
use crate::timestamp::parse_stored_timestamp;
use crate::types::{bind_value, ColumnSpec, ColumnType, Row, TableSpec, Watermark};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// A table held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryTable {
    pub name: Identifier,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl MemoryTable {
    fn column_position(&self, name: &Identifier) -> Option<usize> {
        self.columns.iter().position(|c| name.matches(c.name.as_str()))
    }

    /// Values of one column across all committed rows.
    pub fn column_values(&self, name: &str) -> Vec<Option<&str>> {
        match self.columns.iter().position(|c| c.name.matches(name)) {
            Some(idx) => self.rows.iter().map(|r| r[idx].as_deref()).collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: BTreeMap<String, MemoryTable>,
    unique: BTreeSet<(String, String)>,
    ddl_failure: Option<String>,
    watermark_failure: Option<String>,
    begin_failure: Option<String>,
    statements: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforce a UNIQUE constraint on `table.column` once the table exists.
    pub fn with_unique(mut self, table: &str, column: &str) -> Self {
        self.unique
            .insert((table.to_ascii_lowercase(), column.to_ascii_lowercase()));
        self
    }

    /// Make every subsequent `CREATE TABLE` fail with `message`.
    pub fn fail_ddl(&mut self, message: impl Into<String>) {
        self.ddl_failure = Some(message.into());
    }

    /// Make every subsequent `MAX` query fail with `message`.
    pub fn fail_watermark(&mut self, message: impl Into<String>) {
        self.watermark_failure = Some(message.into());
    }

    /// Make every subsequent `BEGIN` fail with `message`.
    pub fn fail_begin(&mut self, message: impl Into<String>) {
        self.begin_failure = Some(message.into());
    }

    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.get(&name.to_ascii_lowercase())
    }

    pub fn row_count(&self, name: &str) -> usize {
        self.table(name).map(|t| t.rows.len()).unwrap_or(0)
    }

    /// SQL and transaction-control statements in the order they were issued.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn clear_statements(&mut self) {
        self.statements.clear();
    }

    fn bind_row(
        &self,
        spec: &TableSpec,
        row: &Row,
    ) -> Result<(String, Vec<Option<String>>), StoreError> {
        let key = spec.name.folded();
        let table = self
            .tables
            .get(&key)
            .ok_or_else(|| StoreError::undefined_table(spec.name.as_str()))?;

        if row.len() != table.columns.len() {
            return Err(StoreError::new(
                StoreErrorKind::InvalidValue,
                format!(
                    "INSERT has {} expressions but table \"{}\" has {} columns",
                    row.len(),
                    key,
                    table.columns.len()
                ),
            ));
        }

        let mut bound = Vec::with_capacity(row.len());
        for (column, raw) in table.columns.iter().zip(&row.values) {
            let value = bind_value(raw);
            if let (ColumnType::Timestamp, Some(v)) = (column.sql_type, value) {
                if parse_stored_timestamp(v).is_err() {
                    return Err(StoreError::new(
                        StoreErrorKind::InvalidValue,
                        format!("invalid input syntax for type timestamp: \"{v}\""),
                    ));
                }
            }
            bound.push(value.map(str::to_string));
        }
        Ok((key, bound))
    }

    fn check_unique(
        &self,
        key: &str,
        values: &[Option<String>],
        staged: &[(String, Vec<Option<String>>)],
    ) -> Result<(), StoreError> {
        let Some(table) = self.tables.get(key) else {
            return Ok(());
        };

        for (idx, column) in table.columns.iter().enumerate() {
            if !self.unique.contains(&(key.to_string(), column.name.folded())) {
                continue;
            }
            let Some(candidate) = values[idx].as_deref() else {
                continue;
            };

            let committed = table.rows.iter().map(|r| r[idx].as_deref());
            let pending = staged
                .iter()
                .filter(|(t, _)| t == key)
                .map(|(_, r)| r[idx].as_deref());

            if committed.chain(pending).any(|v| v == Some(candidate)) {
                return Err(StoreError::new(
                    StoreErrorKind::ConstraintViolation,
                    format!(
                        "duplicate key value violates unique constraint \"{}_{}_key\"",
                        key,
                        column.name.folded()
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for MemoryStore {
    async fn create_table(&mut self, spec: &TableSpec) -> Result<(), StoreError> {
        self.statements.push(sql::create_table(spec));

        if let Some(message) = &self.ddl_failure {
            return Err(StoreError::new(StoreErrorKind::Other, message.clone()));
        }

        let key = spec.name.folded();
        if self.tables.contains_key(&key) {
            return Ok(());
        }

        let mut seen = HashSet::new();
        for column in &spec.columns {
            if !seen.insert(column.name.folded()) {
                return Err(StoreError::new(
                    StoreErrorKind::Other,
                    format!("column \"{}\" specified more than once", column.name.folded()),
                ));
            }
        }

        self.tables.insert(
            key,
            MemoryTable {
                name: spec.name.clone(),
                columns: spec.columns.clone(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    async fn max_timestamp(
        &mut self,
        table: &Identifier,
        column: &Identifier,
    ) -> Result<Watermark, StoreError> {
        self.statements.push(sql::max_value(table, column));

        if let Some(message) = &self.watermark_failure {
            return Err(StoreError::new(StoreErrorKind::Other, message.clone()));
        }

        let stored = self
            .tables
            .get(&table.folded())
            .ok_or_else(|| StoreError::undefined_table(table.as_str()))?;
        let idx = stored.column_position(column).ok_or_else(|| {
            StoreError::new(
                StoreErrorKind::UndefinedColumn,
                format!("column \"{}\" does not exist", column.folded()),
            )
        })?;

        let values = stored.rows.iter().filter_map(|r| r[idx].as_deref());
        match stored.columns[idx].sql_type {
            ColumnType::Timestamp => {
                let max = values.filter_map(|v| parse_stored_timestamp(v).ok()).max();
                Ok(Watermark::from(max))
            }
            ColumnType::Text => match values.max() {
                Some(v) => parse_stored_timestamp(v)
                    .map(Watermark::at)
                    .map_err(|e| StoreError::new(StoreErrorKind::InvalidValue, e.to_string())),
                None => Ok(Watermark::null()),
            },
        }
    }

    async fn begin<'a>(&'a mut self) -> Result<Box<dyn Transaction + 'a>, StoreError> {
        self.statements.push("BEGIN".to_string());
        if let Some(message) = &self.begin_failure {
            return Err(StoreError::new(StoreErrorKind::Connection, message.clone()));
        }
        Ok(Box::new(MemoryTransaction {
            store: self,
            staged: Vec::new(),
        }))
    }
}

/// Transaction over a [`MemoryStore`]; rows become visible on commit.
pub struct MemoryTransaction<'a> {
    store: &'a mut MemoryStore,
    staged: Vec<(String, Vec<Option<String>>)>,
}

#[async_trait]
impl<'a> Transaction for MemoryTransaction<'a> {
    async fn insert_row(&mut self, spec: &TableSpec, row: &Row) -> Result<(), StoreError> {
        self.store
            .statements
            .push(sql::insert_row(&spec.name, spec.arity()));

        let (key, values) = self.store.bind_row(spec, row)?;
        self.store.check_unique(&key, &values, &self.staged)?;
        self.staged.push((key, values));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { store, staged } = *self;
        store.statements.push("COMMIT".to_string());
        for (key, values) in staged {
            if let Some(table) = store.tables.get_mut(&key) {
                table.rows.push(values);
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.store.statements.push("ROLLBACK".to_string());
        Ok(())
    }
}
