use askama::Template;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::classify::{Cutoff, Status, classify};
use crate::model::ReportData;
use crate::{ReportError, Result};

/// Bucket labels of the response-time distribution chart.
pub const DISTRIBUTION_BUCKETS: [&str; 5] = ["<100ms", "100-200ms", "200-500ms", "500ms-1s", ">1s"];

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// A formatted value and its annotation.
struct Cell {
    text: String,
    status: Status,
}

impl Cell {
    fn new(text: String, status: Status) -> Self {
        Self { text, status }
    }
}

struct DetailRow {
    label: &'static str,
    status: Status,
    count: String,
    rate: String,
    avg: String,
    min: String,
    med: String,
    max: String,
    p90: String,
    p95: String,
    p99: String,
}

impl DetailRow {
    fn counts(label: &'static str, status: Status, count: String, rate: String) -> Self {
        let dash = || "-".to_string();
        Self {
            label,
            status,
            count,
            rate,
            avg: dash(),
            min: dash(),
            med: dash(),
            max: dash(),
            p90: dash(),
            p95: dash(),
            p99: dash(),
        }
    }
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    test_name: &'a str,
    started_at: String,
    duration_secs: i64,
    max_vus: u64,

    avg: String,
    med: String,
    p95: Cell,
    p99: Cell,

    total_requests: u64,
    requests_per_sec: String,
    failed_requests: Cell,
    failure_rate: Cell,

    checks_passed: u64,
    checks_failed: Cell,
    checks_rate: Cell,

    rows: Vec<DetailRow>,
    generated_at: String,

    data_json: String,
    distribution_json: String,
}

/// Renders the report page.
///
/// Pure: the output depends only on `data` and `generated_at`.
pub fn render(data: &ReportData, generated_at: DateTime<Utc>) -> Result<String> {
    let run = &data.run;
    let d = &run.summary.http_req_duration;
    let failed = &run.summary.http_req_failed;
    let reqs = &run.summary.http_reqs;
    let vus = &run.summary.vus;
    let checks = &data.checks;

    let p95_status = classify(d.p95, Cutoff::P95_DURATION_MS);
    let p99_status = classify(d.p99, Cutoff::P99_DURATION_MS);
    let failure_status = classify(failed.rate, Cutoff::FAILURE_RATE);
    let failed_checks_status = classify(checks.failed as f64, Cutoff::FAILED_CHECKS);
    let check_rate_status = classify(checks.rate, Cutoff::CHECK_PASS_RATE);

    let rows = vec![
        DetailRow {
            label: "HTTP Request Duration",
            status: p95_status.max(p99_status),
            count: reqs.count.to_string(),
            rate: format!("{:.2}/s", reqs.rate),
            avg: ms(d.avg),
            min: ms(d.min),
            med: ms(d.med),
            max: ms(d.max),
            p90: ms(d.p90),
            p95: ms(d.p95),
            p99: ms(d.p99),
        },
        DetailRow::counts(
            "HTTP Request Failures",
            failure_status,
            format!("{} / {}", failed.count, failed.total),
            percent(failed.rate),
        ),
        DetailRow::counts(
            "HTTP Requests",
            Status::Success,
            reqs.count.to_string(),
            format!("{:.2}/s", reqs.rate),
        ),
        DetailRow {
            max: vus.max.to_string(),
            ..DetailRow::counts(
                "Virtual Users",
                Status::Success,
                vus.value.to_string(),
                "-".to_string(),
            )
        },
        DetailRow::counts(
            "Checks",
            failed_checks_status.max(check_rate_status),
            checks.total().to_string(),
            percent(checks.rate),
        ),
    ];

    let data_json = serde_json::to_string(data)
        .map(|json| escape_json_for_script(&json))
        .map_err(|e| ReportError::Render(format!("serialize report data: {e}")))?;
    let distribution_json = serde_json::to_string(&serde_json::json!({
        "labels": DISTRIBUTION_BUCKETS,
        "counts": distribution(data),
    }))
    .map(|json| escape_json_for_script(&json))
    .map_err(|e| ReportError::Render(format!("serialize distribution: {e}")))?;

    let tpl = ReportTemplate {
        test_name: &run.test_name,
        started_at: run.start_time.format(DISPLAY_TIME_FORMAT).to_string(),
        duration_secs: (run.duration / 1000.0).round() as i64,
        max_vus: vus.max,

        avg: ms(d.avg),
        med: ms(d.med),
        p95: Cell::new(ms(d.p95), p95_status),
        p99: Cell::new(ms(d.p99), p99_status),

        total_requests: reqs.count,
        requests_per_sec: format!("{:.2}", reqs.rate),
        failed_requests: Cell::new(failed.count.to_string(), failure_status),
        failure_rate: Cell::new(percent(failed.rate), failure_status),

        checks_passed: checks.passed,
        checks_failed: Cell::new(checks.failed.to_string(), failed_checks_status),
        checks_rate: Cell::new(percent(checks.rate), check_rate_status),

        rows,
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),

        data_json,
        distribution_json,
    };

    tpl.render().map_err(|e| ReportError::Render(e.to_string()))
}

/// Counts of `http_req_duration` sample values per [`DISTRIBUTION_BUCKETS`] entry.
#[must_use]
pub fn distribution(data: &ReportData) -> [u64; 5] {
    let mut buckets = [0u64; 5];
    for sample in data.trend("http_req_duration").unwrap_or_default() {
        let idx = match sample.value {
            v if v < 100.0 => 0,
            v if v < 200.0 => 1,
            v if v < 500.0 => 2,
            v if v < 1000.0 => 3,
            _ => 4,
        };
        buckets[idx] += 1;
    }
    buckets
}

/// Makes serialized JSON safe to place inside a `<script>` element.
///
/// Only characters that can end the element or break the JS parser are
/// rewritten; the result is still valid JSON with the same value.
#[must_use]
pub fn escape_json_for_script(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

fn ms(v: f64) -> String {
    format!("{v:.2}ms")
}

fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::synthetic::sample_report;

    fn at(h: u32) -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2024, 5, 1, h, 0, 0) {
            chrono::LocalResult::Single(t) => t,
            _ => panic!("invalid fixed time"),
        }
    }

    #[test]
    fn escape_rewrites_script_breaking_characters() {
        let escaped = escape_json_for_script(r#"{"a":"</script><b>&","b":"x y"}"#);
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
        assert!(!escaped.contains('&'));

        let raw = serde_json::json!({ "name": "</script>&\u{2028}" }).to_string();
        let back: serde_json::Value = serde_json::from_str(&escape_json_for_script(&raw))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(back["name"], "</script>&\u{2028}");
    }

    #[test]
    fn distribution_buckets_trend_values() {
        let mut data = sample_report(at(0), &mut StdRng::seed_from_u64(4));
        let counts = distribution(&data);
        assert_eq!(counts.iter().sum::<u64>(), 100);
        assert_eq!(counts[0], 0);
        assert_eq!(counts[4], 0);

        data.metrics.clear();
        assert_eq!(distribution(&data), [0; 5]);
    }

    #[test]
    fn detail_rows_follow_classification() {
        let data = sample_report(at(0), &mut StdRng::seed_from_u64(4));
        let html = render(&data, at(1)).unwrap_or_else(|e| panic!("{e}"));

        // Synthetic p95 567.89 crosses the warning cutoff; 13 failed checks are an error.
        assert!(html.contains(r#"<span class="metric-value warning">567.89ms</span>"#));
        assert!(html.contains(r#"<span class="metric-value success">890.12ms</span>"#));
        assert!(html.contains(r#"<span class="metric-value error">13</span>"#));
        assert!(html.contains("<span class=\"status-indicator status-warning\"></span>HTTP Request Duration"));
        assert!(html.contains("<span class=\"status-indicator status-error\"></span>Checks"));
    }
}
