//! Local file and directory sources

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const CSV_EXTENSION: &str = "csv";

/// A local file, or a directory when the path ends with `/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn parse(uri: &str) -> Self {
        Self {
            path: PathBuf::from(uri),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if this source represents a directory (ends with /)
    pub fn is_directory(&self) -> bool {
        let path = self.path.to_string_lossy();
        path.ends_with('/') || path.ends_with(std::path::MAIN_SEPARATOR)
    }

    /// Resolve this source into the CSV files it names.
    ///
    /// A single file is returned as-is whatever its extension; a directory
    /// yields its immediate `.csv` children in name order.
    pub async fn resolve(&self) -> Result<Vec<PathBuf>> {
        if self.is_directory() {
            list_csv_files(&self.path).await
        } else {
            Ok(vec![self.path.clone()])
        }
    }

    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

/// The `.csv` files directly inside `dir`, sorted by file name.
///
/// Subdirectories are skipped even when their name ends in `.csv`.
pub async fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Cannot list {}", dir.display()))?;

    let mut csv_files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let candidate = entry.path();
        if !has_csv_extension(&candidate) {
            continue;
        }
        let is_file = tokio::fs::metadata(&candidate)
            .await
            .map(|m| m.is_file())
            .with_context(|| format!("Cannot stat {}", candidate.display()))?;
        if is_file {
            csv_files.push(candidate);
        }
    }
    csv_files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    tracing::debug!("{} CSV file(s) in {}", csv_files.len(), dir.display());
    Ok(csv_files)
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(CSV_EXTENSION)
}
