//! Table provisioning: derive a [`TableSpec`] from a source and create it on demand.

use crate::error::LoadError;
use load_core::{ColumnSpec, ColumnTypeMap, Connection, Identifier, TableSpec};
use std::path::Path;
use tracing::{debug, info, warn};

/// Table name for a source: the file name without extension, upper-cased.
pub fn derive_table_name(source_id: &str) -> Result<Identifier, LoadError> {
    let stem = Path::new(source_id)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    Identifier::new(stem.to_uppercase()).map_err(|error| LoadError::InvalidIdentifier {
        origin: source_id.to_string(),
        error,
    })
}

/// Derive the destination table for a source and its column names.
///
/// Columns keep the source order. Each column's type comes from `types`,
/// which defaults to TEXT. Duplicate names are not checked here; the store
/// rejects them when the table is created.
pub fn derive_table_spec(
    source_id: &str,
    column_names: &[String],
    types: &ColumnTypeMap,
) -> Result<TableSpec, LoadError> {
    let name = derive_table_name(source_id)?;

    let columns = column_names
        .iter()
        .map(|column| {
            let ident =
                Identifier::new(column.as_str()).map_err(|error| LoadError::InvalidIdentifier {
                    origin: column.clone(),
                    error,
                })?;
            Ok(ColumnSpec::new(ident, types.type_of(column)))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    Ok(TableSpec::new(name, columns))
}

/// Create the destination table if it does not exist.
///
/// An existing table is left untouched, whatever its columns are.
pub async fn ensure_table<C>(conn: &mut C, spec: &TableSpec) -> Result<(), LoadError>
where
    C: Connection + ?Sized,
{
    debug!("DDL: {}", load_core::sql::create_table(spec));

    match conn.create_table(spec).await {
        Ok(()) => {
            info!("Table '{}' created or already exists.", spec.name);
            Ok(())
        }
        Err(e) => {
            warn!("Error creating table {}: {e}", spec.name);
            Err(LoadError::Ddl {
                table: spec.name.to_string(),
                message: e.message,
            })
        }
    }
}
