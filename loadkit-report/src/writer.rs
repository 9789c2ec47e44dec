use std::path::{Path, PathBuf};

use crate::{ReportError, Result};

pub const REPORT_FILE: &str = "index.html";
pub const ASSETS_DIR: &str = "assets";

/// Writes rendered reports to `<out_dir>/index.html`.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    out_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.out_dir.join(REPORT_FILE)
    }

    /// Creates the output and assets directories, then replaces the report.
    ///
    /// Returns the absolute path of the written file.
    pub async fn write(&self, html: &str) -> Result<PathBuf> {
        let assets = self.out_dir.join(ASSETS_DIR);
        tokio::fs::create_dir_all(&assets)
            .await
            .map_err(|e| ReportError::io("failed to create directory", &assets, e))?;

        let path = self.report_path();
        tokio::fs::write(&path, html)
            .await
            .map_err(|e| ReportError::io("failed to write report", &path, e))?;

        let path = std::path::absolute(&path)
            .map_err(|e| ReportError::io("failed to resolve report path", &path, e))?;
        tracing::info!(path = %path.display(), bytes = html.len(), "report written");
        Ok(path)
    }
}
