//! Static HTML reports for load-test runs.
//!
//! Data is ingested from a [`ResultSource`] (synthetic samples or a JSON
//! bundle), validated, rendered with [`render`] and written by
//! [`ReportWriter`].

mod classify;
mod error;
mod ingest;
mod model;
mod render;
mod synthetic;
mod writer;

pub use classify::{Cutoff, Status, classify};
pub use error::{ReportError, Result};
pub use ingest::{JsonResults, ResultSource, SyntheticResults, ingest};
pub use model::{
    CheckSummary, CounterSample, DurationSummary, FailureSummary, IndicatorSummary, RateSample,
    ReportData, RunSummary, ThroughputSummary, TimeSeriesMetric, TrendSample, VusSummary,
};
pub use render::{DISTRIBUTION_BUCKETS, distribution, escape_json_for_script, render};
pub use synthetic::{SAMPLE_POINTS, SAMPLE_SPACING_SECS, sample_report};
pub use writer::{ASSETS_DIR, REPORT_FILE, ReportWriter};
