//! JSON-lines report output for load outcomes.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tidemark_incremental_load::LoadReport;
use tokio::io::AsyncWriteExt;

/// Appends one JSON line per [`LoadReport`] to a file.
pub struct ReportWriter {
    file: tokio::fs::File,
    path: PathBuf,
}

impl ReportWriter {
    /// Open `path` for appending, creating it if needed.
    pub async fn open(path: &Path) -> Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open report file {}", path.display()))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&mut self, report: &LoadReport) -> Result<()> {
        let json_line = report
            .to_json_line()
            .context("Failed to serialize load report")?;
        self.file.write_all(json_line.as_bytes()).await?;
        self.file.write_all(b"\n").await?;
        self.file.flush().await?;
        Ok(())
    }
}
