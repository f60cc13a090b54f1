//! Building the column type map from command-line flags and a types file.

use anyhow::{Context, Result};
use load_core::{ColumnType, ColumnTypeMap};
use std::path::Path;

/// Parse a `NAME=TYPE` flag value, e.g. `PREMIERED=timestamp`.
pub fn parse_column_type(s: &str) -> Result<(String, ColumnType), String> {
    let (name, ty) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=TYPE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing column name in '{s}'"));
    }
    let ty = ty.trim().parse::<ColumnType>().map_err(|e| e.to_string())?;
    Ok((name.to_string(), ty))
}

/// Merge an optional YAML types file with `--column-type` overrides.
///
/// Flags win over the file.
pub fn build_column_types(
    types_file: Option<&Path>,
    overrides: &[(String, ColumnType)],
) -> Result<ColumnTypeMap> {
    let mut types = match types_file {
        Some(path) => ColumnTypeMap::from_file(path)
            .with_context(|| format!("Failed to load column types from {}", path.display()))?,
        None => ColumnTypeMap::new(),
    };
    for (name, ty) in overrides {
        types.insert(name.clone(), *ty);
    }
    Ok(types)
}

/// Convert the `--delimiter` character into the single byte the CSV reader expects.
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        anyhow::bail!("Delimiter must be a single ASCII character, got '{delimiter}'");
    }
    Ok(delimiter as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_type() {
        assert_eq!(
            parse_column_type("PREMIERED=timestamp").unwrap(),
            ("PREMIERED".to_string(), ColumnType::Timestamp)
        );
        assert_eq!(
            parse_column_type("NOTES = TEXT").unwrap(),
            ("NOTES".to_string(), ColumnType::Text)
        );
        assert!(parse_column_type("PREMIERED").is_err());
        assert!(parse_column_type("=timestamp").is_err());
        assert!(parse_column_type("PREMIERED=integer").is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("types.yaml");
        std::fs::write(&path, "columns:\n  PREMIERED: timestamp\n  ENDED: timestamp\n").unwrap();

        let types = build_column_types(
            Some(&path),
            &[("ENDED".to_string(), ColumnType::Text)],
        )
        .unwrap();

        assert_eq!(types.type_of("PREMIERED"), ColumnType::Timestamp);
        assert_eq!(types.type_of("ENDED"), ColumnType::Text);
        assert_eq!(types.type_of("TITLE"), ColumnType::Text);
    }

    #[test]
    fn test_missing_types_file() {
        let err = build_column_types(Some(Path::new("/nonexistent/types.yaml")), &[]).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to load column types"));
    }

    #[test]
    fn test_delimiter_byte() {
        assert_eq!(delimiter_byte(';').unwrap(), b';');
        assert_eq!(delimiter_byte('\t').unwrap(), b'\t');
        assert!(delimiter_byte('¦').is_err());
    }
}
