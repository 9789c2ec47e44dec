use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use loadkit_metrics::MetricKind;
use rand::{Rng, RngCore};
use serde_json::json;

use super::{ScenarioKind, Workload, mins};
use crate::Result;
use crate::checks::PerformanceExpectations;
use crate::config::{TestConfig, create_stress_test_config};
use crate::engine::{HttpEngine, Request};
use crate::options::TestOptions;
use crate::reporter::Reporter;
use crate::thresholds::Thresholds;

const BASE_URL: &str = "https://httpbin.org";
const MAX_VUS: u64 = 100;
const PAYLOAD_ITEMS: usize = 1000;

const STRESS_FAILURES: &str = "stress_failures";
const RESPONSE_SIZE: &str = "response_size";
const MEMORY_USAGE: &str = "memory_usage";

/// Escalation to 100 VUs with large payloads and concurrent follow-ups.
#[derive(Debug)]
pub struct StressScenario {
    reporter: Reporter,
    config: TestConfig,
    options: TestOptions,
}

impl StressScenario {
    pub fn new(now: DateTime<Utc>) -> Result<Self> {
        let reporter = Reporter::new("Stress Test")?;
        reporter.add_custom_metric(
            STRESS_FAILURES,
            MetricKind::Counter,
            Some("Stress test failures"),
        )?;
        reporter.add_custom_metric(
            RESPONSE_SIZE,
            MetricKind::Trend,
            Some("Response payload size"),
        )?;
        reporter.add_custom_metric(
            MEMORY_USAGE,
            MetricKind::Gauge,
            Some("Simulated memory usage"),
        )?;

        let custom = Thresholds::new()
            .with("http_req_duration", ["p(95)<2000", "p(99)<5000"])
            .with("http_req_failed", ["rate<0.3"])
            .with(STRESS_FAILURES, ["count<200"]);
        let config = create_stress_test_config(BASE_URL, MAX_VUS, mins(10), Some(&custom))?;
        let options = reporter.test_options(&config, now);

        Ok(Self {
            reporter,
            config,
            options,
        })
    }
}

fn heavy_payload(rng: &mut dyn RngCore) -> serde_json::Value {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let data: Vec<serde_json::Value> = (0..PAYLOAD_ITEMS)
        .map(|id| {
            json!({
                "id": id,
                "timestamp": timestamp,
                "payload": format!("stress_test_data_{}", rng.r#gen::<f64>()),
            })
        })
        .collect();
    json!({ "data": data })
}

impl Workload for StressScenario {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Stress
    }

    fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    fn config(&self) -> &TestConfig {
        &self.config
    }

    fn options(&self) -> &TestOptions {
        &self.options
    }

    fn iteration(&self, engine: &dyn HttpEngine, rng: &mut dyn RngCore) {
        let base = &self.config.base_url;

        let response = engine.send(
            &Request::post(format!("{base}/post"))
                .json(&heavy_payload(rng))
                .with_tag("endpoint", "stress_test")
                .with_tag("payload_size", "large"),
        );
        let ok = self.reporter.check_performance(
            &response,
            &PerformanceExpectations::new(200, Duration::from_millis(2000)),
        );
        if !ok {
            self.reporter.record_metric(STRESS_FAILURES, 1.0, &[]);
        }
        if !response.body.is_empty() {
            self.reporter
                .record_metric(RESPONSE_SIZE, response.body.len() as f64, &[]);
        }
        self.reporter
            .record_metric(MEMORY_USAGE, rng.gen_range(0.0..100.0), &[]);

        let concurrent = engine.batch(&[
            Request::get(format!("{base}/get?param1={}", rng.r#gen::<f64>())),
            Request::get(format!("{base}/delay/1")),
            Request::get(format!("{base}/json")),
        ]);
        for (idx, response) in concurrent.iter().enumerate() {
            self.reporter
                .check_response(response, Some(200), Some(&format!("concurrent_{idx}")));
        }

        engine.sleep(Duration::from_secs_f64(rng.gen_range(0.5..2.0)));
    }
}
