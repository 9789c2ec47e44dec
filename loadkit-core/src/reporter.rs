use chrono::{DateTime, Utc};
use loadkit_metrics::{MetricId, MetricKind, Registry};

use crate::Result;
use crate::checks::{
    CHECKS_METRIC, PerformanceExpectations, performance_checks, response_checks,
};
use crate::config::TestConfig;
use crate::engine::Response;
use crate::options::{TestOptions, test_options};

/// Per-scenario facade over a metric registry and the response checks.
#[derive(Debug)]
pub struct Reporter {
    test_name: String,
    metrics: Registry,
}

impl Reporter {
    pub fn new(test_name: impl Into<String>) -> Result<Self> {
        let metrics = Registry::new();
        metrics.register(CHECKS_METRIC, MetricKind::Rate, Some("Check pass rate"))?;
        Ok(Self {
            test_name: test_name.into(),
            metrics,
        })
    }

    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    #[must_use]
    pub fn metrics(&self) -> &Registry {
        &self.metrics
    }

    pub fn add_custom_metric(
        &self,
        name: &str,
        kind: MetricKind,
        description: Option<&str>,
    ) -> Result<MetricId> {
        Ok(self.metrics.register(name, kind, description)?)
    }

    /// Unregistered names are ignored.
    pub fn record_metric(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        self.metrics.record(name, value, tags);
    }

    /// Checks `expected_status` (200 if `None`) and the 3s latency ceiling.
    pub fn check_response(
        &self,
        response: &Response,
        expected_status: Option<u16>,
        name: Option<&str>,
    ) -> bool {
        response_checks(expected_status.unwrap_or(200), name.unwrap_or("request"))
            .evaluate(response, &self.metrics)
    }

    pub fn check_performance(
        &self,
        response: &Response,
        expectations: &PerformanceExpectations,
    ) -> bool {
        performance_checks(expectations).evaluate(response, &self.metrics)
    }

    #[must_use]
    pub fn test_options(&self, config: &TestConfig, now: DateTime<Utc>) -> TestOptions {
        test_options(&self.test_name, config, now)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use loadkit_metrics::MetricValue;

    use super::*;

    fn rate_for(reporter: &Reporter, check: &str) -> Option<(u64, u64)> {
        reporter
            .metrics()
            .summarize()
            .into_iter()
            .find(|s| {
                s.name == CHECKS_METRIC
                    && s.tags.iter().any(|(k, v)| k == "check" && v == check)
            })
            .and_then(|s| match s.values {
                MetricValue::Rate { total, hits, .. } => Some((hits, total)),
                _ => None,
            })
    }

    #[test]
    fn check_response_records_each_outcome() {
        let reporter = Reporter::new("Basic Load Test").unwrap_or_else(|e| panic!("{e}"));
        let ok = Response::new(200, Duration::from_millis(120));
        let slow = Response::new(200, Duration::from_millis(4500));

        assert!(reporter.check_response(&ok, None, Some("get")));
        assert!(!reporter.check_response(&slow, None, Some("get")));

        assert_eq!(rate_for(&reporter, "get status is 200"), Some((2, 2)));
        assert_eq!(rate_for(&reporter, "get response time < 3000ms"), Some((1, 2)));
    }

    #[test]
    fn custom_metrics_record_only_when_registered() {
        let reporter = Reporter::new("API Load Test").unwrap_or_else(|e| panic!("{e}"));
        reporter
            .add_custom_metric("api_errors", MetricKind::Counter, Some("API error count"))
            .unwrap_or_else(|e| panic!("{e}"));

        reporter.record_metric("api_errors", 1.0, &[]);
        reporter.record_metric("api_errors", 1.0, &[]);
        reporter.record_metric("never_registered", 5.0, &[]);

        let summary = reporter.metrics().summarize();
        assert!(summary.iter().all(|s| s.name != "never_registered"));
        let errors = summary
            .iter()
            .find(|s| s.name == "api_errors")
            .map(|s| s.values.clone());
        assert_eq!(errors, Some(MetricValue::Counter(2.0)));
    }

    #[test]
    fn re_registering_with_another_kind_fails() {
        let reporter = Reporter::new("t").unwrap_or_else(|e| panic!("{e}"));
        assert!(reporter.add_custom_metric(CHECKS_METRIC, MetricKind::Trend, None).is_err());
    }
}
