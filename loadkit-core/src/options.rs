use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::config::{Stage, TestConfig};
use crate::thresholds::Thresholds;

/// Trend statistics the engine reports in its end-of-test summary.
pub const SUMMARY_TREND_STATS: [&str; 7] = ["avg", "min", "med", "max", "p(90)", "p(95)", "p(99)"];

/// Options object the engine reads from a test script.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOptions {
    pub stages: Vec<Stage>,
    pub thresholds: Thresholds,
    pub tags: BTreeMap<String, String>,
    pub summary_trend_stats: Vec<String>,
    #[serde(rename = "insecureSkipTLSVerify", skip_serializing_if = "std::ops::Not::not")]
    pub insecure_skip_tls_verify: bool,
}

/// Thresholds every scenario starts from before its own are overlaid.
#[must_use]
pub fn default_thresholds() -> Thresholds {
    Thresholds::new()
        .with("http_req_duration", ["p(95)<3000", "p(99)<5000"])
        .with("http_req_failed", ["rate<0.1"])
        .with("http_reqs", ["count>30"])
        .with("checks", ["rate>0.7"])
}

/// Resolves a scenario config into engine options.
///
/// Thresholds are the defaults overridden per metric by the config's. Tags
/// start with `testName` and `timestamp`; config tags may override either.
#[must_use]
pub fn test_options(test_name: &str, config: &TestConfig, now: DateTime<Utc>) -> TestOptions {
    let mut tags = BTreeMap::from([
        ("testName".to_string(), test_name.to_string()),
        (
            "timestamp".to_string(),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
    ]);
    tags.extend(config.tags.clone());

    TestOptions {
        stages: config.stages.clone(),
        thresholds: default_thresholds().merged(&config.thresholds),
        tags,
        summary_trend_stats: SUMMARY_TREND_STATS.iter().map(|s| s.to_string()).collect(),
        insecure_skip_tls_verify: config.insecure_skip_tls_verify,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;
    use crate::config::create_stress_test_config;

    fn fixed_now() -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0) {
            chrono::LocalResult::Single(t) => t,
            _ => panic!("invalid fixed time"),
        }
    }

    #[test]
    fn options_merge_default_thresholds_and_tags() {
        let cfg = create_stress_test_config(
            "https://httpbin.org",
            100,
            Duration::from_secs(600),
            None,
        )
        .unwrap_or_else(|e| panic!("{e}"));

        let opts = test_options("Stress Test", &cfg, fixed_now());

        assert_eq!(
            opts.thresholds.get("http_req_duration"),
            Some(&["p(95)<1000".to_string(), "p(99)<2000".to_string()][..])
        );
        assert_eq!(
            opts.thresholds.get("http_reqs"),
            Some(&["count>30".to_string()][..])
        );
        assert_eq!(
            opts.thresholds.get("checks"),
            Some(&["rate>0.7".to_string()][..])
        );
        assert_eq!(
            opts.tags.get("testName").map(String::as_str),
            Some("Stress Test")
        );
        assert_eq!(
            opts.tags.get("timestamp").map(String::as_str),
            Some("2024-05-01T12:00:00.000Z")
        );
        assert_eq!(opts.tags.get("testType").map(String::as_str), Some("stress"));
        assert_eq!(opts.summary_trend_stats.len(), 7);
        assert_eq!(opts.stages.len(), 4);
    }

    #[test]
    fn options_serialize_with_engine_keys() {
        let cfg = create_stress_test_config("https://httpbin.org", 10, Duration::from_secs(60), None)
            .unwrap_or_else(|e| panic!("{e}"));
        let opts = test_options("Stress Test", &cfg, fixed_now());

        let v = serde_json::to_value(&opts).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(v["summaryTrendStats"][4], "p(90)");
        assert_eq!(v["stages"][0]["duration"], "5m");
        assert_eq!(v["stages"][0]["target"], 1);
        assert_eq!(v["thresholds"]["http_req_failed"][0], "rate<0.2");
        assert!(v.get("insecureSkipTLSVerify").is_none());
    }
}
