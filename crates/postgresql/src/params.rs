//! Positional parameter binding for row inserts.

use chrono::NaiveDateTime;
use load_core::{
    bind_value, parse_stored_timestamp, ColumnType, Row, StoreError, StoreErrorKind, TableSpec,
};
use tokio_postgres::types::{ToSql, Type};

/// Declared parameter types for `INSERT INTO <table> VALUES (...)`.
pub(crate) fn param_types(spec: &TableSpec) -> Vec<Type> {
    spec.columns
        .iter()
        .map(|c| match c.sql_type {
            ColumnType::Timestamp => Type::TIMESTAMP,
            ColumnType::Text => Type::TEXT,
        })
        .collect()
}

/// Box each value of `row` for binding against the column at the same position.
///
/// Empty cells bind as NULL. TIMESTAMP values accept the input forms the
/// server accepts (bare dates, a `T` separator, fractional seconds); anything
/// else is rejected the way the server would reject it.
pub(crate) fn bind_row(
    spec: &TableSpec,
    row: &Row,
) -> Result<Vec<Box<dyn ToSql + Sync + Send>>, StoreError> {
    if row.len() != spec.arity() {
        return Err(StoreError::new(
            StoreErrorKind::InvalidValue,
            format!(
                "INSERT has {} expressions but table \"{}\" has {} columns",
                row.len(),
                spec.name,
                spec.arity()
            ),
        ));
    }

    spec.columns
        .iter()
        .zip(&row.values)
        .map(|(column, raw)| bind_one(column.sql_type, raw))
        .collect()
}

fn bind_one(sql_type: ColumnType, raw: &str) -> Result<Box<dyn ToSql + Sync + Send>, StoreError> {
    let value = bind_value(raw);
    match sql_type {
        ColumnType::Text => Ok(Box::new(value.map(str::to_string))),
        ColumnType::Timestamp => match value {
            None => Ok(Box::new(None::<NaiveDateTime>)),
            Some(v) => parse_stored_timestamp(v)
                .map(|ts| Box::new(ts) as Box<dyn ToSql + Sync + Send>)
                .map_err(|_| {
                    StoreError::new(
                        StoreErrorKind::InvalidValue,
                        format!("invalid input syntax for type timestamp: \"{v}\""),
                    )
                }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use load_core::{ColumnSpec, Identifier};

    fn spec() -> TableSpec {
        TableSpec::new(
            Identifier::new("SHOWS").unwrap(),
            vec![
                ColumnSpec::new(Identifier::new("TITLE").unwrap(), ColumnType::Text),
                ColumnSpec::new(Identifier::new("AIRDATE").unwrap(), ColumnType::Timestamp),
            ],
        )
    }

    #[test]
    fn test_param_types_follow_columns() {
        assert_eq!(param_types(&spec()), vec![Type::TEXT, Type::TIMESTAMP]);
    }

    #[test]
    fn test_bind_row() {
        let row = Row::new(0, vec!["Pilot".into(), "2024-01-01 20:00:00".into()]);
        assert_eq!(bind_row(&spec(), &row).unwrap().len(), 2);

        let blanks = Row::new(1, vec![String::new(), String::new()]);
        assert_eq!(bind_row(&spec(), &blanks).unwrap().len(), 2);
    }

    #[test]
    fn test_bind_row_rejects_bad_timestamp() {
        let row = Row::new(0, vec!["Pilot".into(), "next tuesday".into()]);
        let err = bind_row(&spec(), &row).err().unwrap();
        assert_eq!(err.kind, StoreErrorKind::InvalidValue);
        assert!(err.message.contains("next tuesday"));
    }

    #[test]
    fn test_bind_row_accepts_server_timestamp_forms() {
        for airdate in [
            "2024-01-02",
            "2024-01-02T10:00:00",
            "2024-01-02 10:00:00.250",
            "2024-01-02 10:00",
        ] {
            let row = Row::new(0, vec!["Pilot".into(), airdate.into()]);
            assert!(bind_row(&spec(), &row).is_ok(), "{airdate} should bind");
        }

        let row = Row::new(0, vec!["Pilot".into(), "2024-13-02".into()]);
        assert!(bind_row(&spec(), &row).is_err());
    }

    #[test]
    fn test_bind_row_rejects_wrong_arity() {
        let row = Row::new(0, vec!["Pilot".into()]);
        let err = bind_row(&spec(), &row).err().unwrap();
        assert!(err.message.contains("1 expressions"));
    }
}
