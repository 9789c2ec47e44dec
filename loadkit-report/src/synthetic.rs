use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;

use crate::model::{
    CheckSummary, CounterSample, DurationSummary, FailureSummary, IndicatorSummary, RateSample,
    ReportData, RunSummary, ThroughputSummary, TimeSeriesMetric, TrendSample, VusSummary,
};

pub const SAMPLE_POINTS: usize = 100;
pub const SAMPLE_SPACING_SECS: i64 = 6;
const RUN_LENGTH_MS: i64 = 10 * 60 * 1000;

/// Representative data for the full bundle schema.
///
/// Summary numbers are fixed; the three series are drawn from `rng`, 100
/// points 6 seconds apart with the last one at `now`.
pub fn sample_report<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> ReportData {
    ReportData {
        run: RunSummary {
            test_name: "Load Test".to_string(),
            start_time: now,
            end_time: now + TimeDelta::milliseconds(RUN_LENGTH_MS),
            duration: RUN_LENGTH_MS as f64,
            summary: IndicatorSummary {
                http_req_duration: DurationSummary {
                    avg: 245.67,
                    min: 89.12,
                    med: 234.45,
                    max: 1234.56,
                    p90: 456.78,
                    p95: 567.89,
                    p99: 890.12,
                },
                http_req_failed: FailureSummary {
                    rate: 0.034,
                    count: 17,
                    total: 500,
                },
                http_reqs: ThroughputSummary {
                    count: 500,
                    rate: 8.33,
                },
                vus: VusSummary { value: 50, max: 100 },
            },
        },
        checks: CheckSummary::new(487, 13),
        metrics: vec![
            TimeSeriesMetric::Trend {
                name: "http_req_duration".to_string(),
                values: trend_series(now, rng),
            },
            TimeSeriesMetric::Rate {
                name: "http_req_failed".to_string(),
                values: rate_series(now, rng),
            },
            TimeSeriesMetric::Counter {
                name: "http_reqs".to_string(),
                values: counter_series(now, rng),
            },
        ],
    }
}

fn timestamp(now: DateTime<Utc>, i: usize) -> DateTime<Utc> {
    let steps_back = (SAMPLE_POINTS - 1 - i) as i64;
    now - TimeDelta::seconds(steps_back * SAMPLE_SPACING_SECS)
}

fn trend_series<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Vec<TrendSample> {
    (0..SAMPLE_POINTS)
        .map(|i| TrendSample {
            timestamp: timestamp(now, i),
            value: rng.gen_range(100.0..600.0),
            p95: rng.gen_range(200.0..900.0),
            p99: rng.gen_range(300.0..1300.0),
        })
        .collect()
}

fn rate_series<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Vec<RateSample> {
    (0..SAMPLE_POINTS)
        .map(|i| RateSample {
            timestamp: timestamp(now, i),
            rate: rng.gen_range(0.0..0.1),
            total: rng.gen_range(10..60),
        })
        .collect()
}

fn counter_series<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Vec<CounterSample> {
    let mut cumulative = 0u64;
    (0..SAMPLE_POINTS)
        .map(|i| {
            let increment: u64 = rng.gen_range(1..=10);
            cumulative += increment;
            CounterSample {
                timestamp: timestamp(now, i),
                count: cumulative,
                rate: increment as f64 / SAMPLE_SPACING_SECS as f64,
            }
        })
        .collect()
}
