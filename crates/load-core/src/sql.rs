//! SQL text for the three statements a load issues.
//!
//! Identifiers are interpolated; values never are. Existing destination tables
//! were created from exactly these shapes, so they must not drift.

use crate::identifier::Identifier;
use crate::types::TableSpec;

/// `CREATE TABLE IF NOT EXISTS <TABLE> (<col> <TYPE>, ...);`
pub fn create_table(spec: &TableSpec) -> String {
    let columns = spec
        .columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.sql_type.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {} ({columns});", spec.name)
}

/// `SELECT MAX(<column>) FROM <TABLE>`
pub fn max_value(table: &Identifier, column: &Identifier) -> String {
    format!("SELECT MAX({column}) FROM {table}")
}

/// `INSERT INTO <TABLE> VALUES ($1, $2, ...)`
pub fn insert_row(table: &Identifier, arity: usize) -> String {
    let placeholders = (1..=arity)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {table} VALUES ({placeholders})")
}
