use std::time::Duration;

use chrono::{DateTime, Utc};
use loadkit_metrics::MetricKind;
use rand::{Rng, RngCore};
use serde_json::json;

use super::{ScenarioKind, Workload, mins, scenario_tags};
use crate::Result;
use crate::config::{Stage, TestConfig, create_load_test_config};
use crate::engine::{HttpEngine, Request, Response, millis_f64};
use crate::env::Env;
use crate::options::TestOptions;
use crate::reporter::Reporter;
use crate::thresholds::Thresholds;

const ENV_BASE_URL: &str = "K6_LOAD_BASE_URL";
const DEFAULT_BASE_URL: &str = "https://httpbin.org";

const THROUGHPUT: &str = "throughput";
const ERROR_RATE: &str = "error_rate";
const CONNECTION_TIME: &str = "connection_time";

const ENDPOINTS: [&str; 8] = [
    "/get", "/post", "/put", "/delete", "/json", "/xml", "/html", "/delay/1",
];

/// Sustained mixed-method traffic over a 25 minute profile.
#[derive(Debug)]
pub struct LoadScenario {
    reporter: Reporter,
    config: TestConfig,
    options: TestOptions,
}

impl LoadScenario {
    pub fn new(env: &Env, now: DateTime<Utc>) -> Result<Self> {
        let reporter = Reporter::new("Load Test")?;
        reporter.add_custom_metric(THROUGHPUT, MetricKind::Counter, Some("Requests throughput"))?;
        reporter.add_custom_metric(ERROR_RATE, MetricKind::Rate, Some("Error rate percentage"))?;
        reporter.add_custom_metric(
            CONNECTION_TIME,
            MetricKind::Trend,
            Some("Connection establishment time"),
        )?;

        let thresholds = Thresholds::new()
            .with("http_req_duration", ["p(50)<400", "p(95)<800", "p(99)<1500"])
            .with("http_req_failed", ["rate<0.1"])
            .with(THROUGHPUT, ["count>300"])
            .with(ERROR_RATE, ["rate<0.1"]);

        let stages = vec![
            Stage::new(mins(5), 20),
            Stage::new(mins(10), 50),
            Stage::new(mins(5), 20),
            Stage::new(mins(5), 0),
        ];
        let base_url = env.string_or(ENV_BASE_URL, DEFAULT_BASE_URL);
        let config = create_load_test_config(&base_url, stages, Some(thresholds), env)?
            .with_tags(scenario_tags(ScenarioKind::Load));
        let options = reporter.test_options(&config, now);

        Ok(Self {
            reporter,
            config,
            options,
        })
    }

    fn request(&self, endpoint: &str, rng: &mut dyn RngCore) -> Request {
        let url = format!("{}{endpoint}", self.config.base_url);
        match endpoint {
            "/post" => Request::post(url)
                .json(&json!({
                    "userId": rng.gen_range(0..1000),
                    "title": format!("Load test {}", Utc::now().timestamp_millis()),
                    "body": "This is a load test request",
                }))
                .with_tag("endpoint", "post")
                .with_tag("method", "POST"),
            "/put" => Request::put(url)
                .json(&json!({
                    "userId": rng.gen_range(0..1000),
                    "id": rng.gen_range(0..100),
                    "title": "Updated title",
                    "body": "Updated body",
                }))
                .with_tag("endpoint", "put")
                .with_tag("method", "PUT"),
            "/delete" => Request::delete(url)
                .with_tag("endpoint", "delete")
                .with_tag("method", "DELETE"),
            other => Request::get(url)
                .with_tag("endpoint", other.trim_start_matches('/'))
                .with_tag("method", "GET"),
        }
    }

    fn record(&self, endpoint: &str, response: &Response) {
        self.reporter.record_metric(THROUGHPUT, 1.0, &[]);
        self.reporter.record_metric(
            CONNECTION_TIME,
            millis_f64(response.timings.connecting),
            &[],
        );

        let ok = self.reporter.check_response(response, Some(200), Some(endpoint));
        self.reporter
            .record_metric(ERROR_RATE, if ok { 0.0 } else { 1.0 }, &[]);
    }
}

impl Workload for LoadScenario {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Load
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
        let endpoint = ENDPOINTS[rng.gen_range(0..ENDPOINTS.len())];
        let response = engine.send(&self.request(endpoint, rng));
        self.record(endpoint, &response);

        engine.sleep(Duration::from_secs_f64(rng.gen_range(1.0..4.0)));
    }
}
