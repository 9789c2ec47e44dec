use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ReportError, Result};

/// Response-time distribution in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationSummary {
    pub avg: f64,
    pub min: f64,
    pub med: f64,
    pub max: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailureSummary {
    pub rate: f64,
    pub count: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSummary {
    pub count: u64,
    /// Requests per second.
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VusSummary {
    pub value: u64,
    pub max: u64,
}

/// Per-indicator aggregates, keyed by the engine's metric names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSummary {
    pub http_req_duration: DurationSummary,
    pub http_req_failed: FailureSummary,
    pub http_reqs: ThroughputSummary,
    pub vus: VusSummary,
}

/// Aggregate statistics for one test execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub test_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Milliseconds.
    pub duration: f64,
    pub summary: IndicatorSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub passed: u64,
    pub failed: u64,
    pub rate: f64,
}

impl CheckSummary {
    /// Derives the pass rate; no checks at all counts as a full pass.
    #[must_use]
    pub fn new(passed: u64, failed: u64) -> Self {
        let total = passed + failed;
        let rate = if total == 0 {
            1.0
        } else {
            passed as f64 / total as f64
        };
        Self {
            passed,
            failed,
            rate,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.passed + self.failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSample {
    pub timestamp: DateTime<Utc>,
    pub rate: f64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterSample {
    pub timestamp: DateTime<Utc>,
    /// Cumulative.
    pub count: u64,
    /// Per second.
    pub rate: f64,
}

/// A named indicator with its ordered samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TimeSeriesMetric {
    Trend {
        name: String,
        values: Vec<TrendSample>,
    },
    Rate {
        name: String,
        values: Vec<RateSample>,
    },
    Counter {
        name: String,
        values: Vec<CounterSample>,
    },
}

impl TimeSeriesMetric {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Trend { name, .. } | Self::Rate { name, .. } | Self::Counter { name, .. } => name,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Trend { values, .. } => values.len(),
            Self::Rate { values, .. } => values.len(),
            Self::Counter { values, .. } => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn timestamps(&self) -> Vec<DateTime<Utc>> {
        match self {
            Self::Trend { values, .. } => values.iter().map(|s| s.timestamp).collect(),
            Self::Rate { values, .. } => values.iter().map(|s| s.timestamp).collect(),
            Self::Counter { values, .. } => values.iter().map(|s| s.timestamp).collect(),
        }
    }
}

/// Everything one report is rendered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    #[serde(flatten)]
    pub run: RunSummary,
    pub checks: CheckSummary,
    pub metrics: Vec<TimeSeriesMetric>,
}

impl ReportData {
    /// Trend samples of the series called `name`, if it is a trend.
    #[must_use]
    pub fn trend(&self, name: &str) -> Option<&[TrendSample]> {
        self.metrics.iter().find_map(|m| match m {
            TimeSeriesMetric::Trend { name: n, values } if n == name => Some(values.as_slice()),
            _ => None,
        })
    }

    /// Checks the bundle invariants.
    ///
    /// Rates lie in `[0, 1]` and agree with the counts they summarize, durations
    /// are finite and non-negative, series timestamps never go backwards and the
    /// run does not end before it starts.
    pub fn validate(&self) -> Result<()> {
        let run = &self.run;
        if run.end_time < run.start_time {
            return Err(invalid(format!(
                "endTime {} is before startTime {}",
                run.end_time, run.start_time
            )));
        }
        check_duration("duration", run.duration)?;

        let d = &run.summary.http_req_duration;
        for (field, v) in [
            ("avg", d.avg),
            ("min", d.min),
            ("med", d.med),
            ("max", d.max),
            ("p90", d.p90),
            ("p95", d.p95),
            ("p99", d.p99),
        ] {
            check_duration(&format!("http_req_duration.{field}"), v)?;
        }

        let failed = &run.summary.http_req_failed;
        check_rate("http_req_failed.rate", failed.rate)?;
        if failed.count > failed.total {
            return Err(invalid(format!(
                "http_req_failed.count {} exceeds total {}",
                failed.count, failed.total
            )));
        }
        check_derived_rate("http_req_failed.rate", failed.rate, failed.count, failed.total)?;
        check_non_negative("http_reqs.rate", run.summary.http_reqs.rate)?;
        check_rate("checks.rate", self.checks.rate)?;
        check_derived_rate(
            "checks.rate",
            self.checks.rate,
            self.checks.passed,
            self.checks.total(),
        )?;

        for metric in &self.metrics {
            let name = metric.name();
            match metric {
                TimeSeriesMetric::Trend { values, .. } => {
                    for s in values {
                        check_duration(&format!("{name}.value"), s.value)?;
                        check_duration(&format!("{name}.p95"), s.p95)?;
                        check_duration(&format!("{name}.p99"), s.p99)?;
                    }
                }
                TimeSeriesMetric::Rate { values, .. } => {
                    for s in values {
                        check_rate(&format!("{name}.rate"), s.rate)?;
                    }
                }
                TimeSeriesMetric::Counter { values, .. } => {
                    for s in values {
                        check_non_negative(&format!("{name}.rate"), s.rate)?;
                    }
                }
            }

            if metric
                .timestamps()
                .windows(2)
                .any(|pair| pair[1] < pair[0])
            {
                return Err(invalid(format!("series `{name}` has decreasing timestamps")));
            }
        }

        Ok(())
    }
}

fn invalid(msg: String) -> ReportError {
    ReportError::Invalid(msg)
}

fn check_non_negative(field: &str, v: f64) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be a finite non-negative number, got {v}")))
    }
}

fn check_duration(field: &str, v: f64) -> Result<()> {
    check_non_negative(field, v)
}

/// Largest accepted gap between a stored rate and `hits / total`.
const RATE_TOLERANCE: f64 = 0.005;

fn check_derived_rate(field: &str, rate: f64, hits: u64, total: u64) -> Result<()> {
    if total == 0 {
        return Ok(());
    }
    let derived = hits as f64 / total as f64;
    if (rate - derived).abs() <= RATE_TOLERANCE {
        Ok(())
    } else {
        Err(invalid(format!(
            "{field} {rate} does not match {hits}/{total} ({derived:.4})"
        )))
    }
}

fn check_rate(field: &str, v: f64) -> Result<()> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be within [0, 1], got {v}")))
    }
}
