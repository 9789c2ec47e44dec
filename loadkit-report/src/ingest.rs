use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::ThreadRng;

use crate::model::ReportData;
use crate::synthetic::sample_report;
use crate::{ReportError, Result};

/// Where report data comes from.
pub trait ResultSource {
    /// Short label for logs.
    fn describe(&self) -> String;

    fn load(&mut self) -> Result<ReportData>;
}

/// Fabricated sample data; the default when no results file is given.
#[derive(Debug)]
pub struct SyntheticResults<R = ThreadRng> {
    now: DateTime<Utc>,
    rng: R,
}

impl SyntheticResults<ThreadRng> {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            rng: rand::thread_rng(),
        }
    }
}

impl<R: Rng> SyntheticResults<R> {
    #[must_use]
    pub fn with_rng(now: DateTime<Utc>, rng: R) -> Self {
        Self { now, rng }
    }
}

impl<R: Rng> ResultSource for SyntheticResults<R> {
    fn describe(&self) -> String {
        "synthetic sample data".to_string()
    }

    fn load(&mut self) -> Result<ReportData> {
        Ok(sample_report(self.now, &mut self.rng))
    }
}

/// A JSON results bundle on disk.
#[derive(Debug, Clone)]
pub struct JsonResults {
    path: PathBuf,
}

impl JsonResults {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSource for JsonResults {
    fn describe(&self) -> String {
        format!("results bundle {}", self.path.display())
    }

    fn load(&mut self) -> Result<ReportData> {
        let bytes = std::fs::read(&self.path)
            .map_err(|e| ReportError::io("failed to read results bundle", &self.path, e))?;
        serde_json::from_slice(&bytes).map_err(|source| ReportError::Json {
            path: self.path.clone(),
            source,
        })
    }
}

/// Loads report data from `source` and checks its invariants.
pub fn ingest(source: &mut dyn ResultSource) -> Result<ReportData> {
    tracing::debug!(source = %source.describe(), "ingesting results");
    let data = source.load()?;
    data.validate()?;
    tracing::info!(
        test_name = %data.run.test_name,
        series = data.metrics.len(),
        points = data.metrics.iter().map(|m| m.len()).sum::<usize>(),
        "results ingested"
    );
    Ok(data)
}
