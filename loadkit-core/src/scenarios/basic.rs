use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde_json::json;

use super::{RampDefaults, ScenarioKind, Workload, mins, ramp_stages, scenario_tags};
use crate::Result;
use crate::config::{TestConfig, create_load_test_config};
use crate::engine::{HttpEngine, Request};
use crate::env::Env;
use crate::options::TestOptions;
use crate::reporter::Reporter;

const ENV_PREFIX: &str = "K6_BASIC_";
const DEFAULT_BASE_URL: &str = "https://httpbin.org";
const ENDPOINTS: [&str; 3] = ["get", "delay", "post"];

/// Smoke-level ramp hitting three httpbin endpoints in one batch.
#[derive(Debug)]
pub struct BasicScenario {
    reporter: Reporter,
    config: TestConfig,
    options: TestOptions,
}

impl BasicScenario {
    pub fn new(env: &Env, now: DateTime<Utc>) -> Result<Self> {
        let reporter = Reporter::new("Basic Load Test")?;

        let base_url = env.string_or(&format!("{ENV_PREFIX}BASE_URL"), DEFAULT_BASE_URL);
        let stages = ramp_stages(
            env,
            ENV_PREFIX,
            RampDefaults {
                ramp_up: mins(1),
                vus: 10,
                steady: mins(3),
                vus_steady: 20,
                ramp_down: mins(1),
            },
        );
        let config = create_load_test_config(&base_url, stages, None, env)?
            .with_tags(scenario_tags(ScenarioKind::Basic));
        let options = reporter.test_options(&config, now);

        Ok(Self {
            reporter,
            config,
            options,
        })
    }
}

impl Workload for BasicScenario {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Basic
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

    fn iteration(&self, engine: &dyn HttpEngine, _rng: &mut dyn RngCore) {
        let base = &self.config.base_url;
        let responses = engine.batch(&[
            Request::get(format!("{base}/get")),
            Request::get(format!("{base}/delay/1")),
            Request::post(format!("{base}/post")).json(&json!({ "test": "data" })),
        ]);

        for (response, endpoint) in responses.iter().zip(ENDPOINTS) {
            self.reporter.check_response(response, Some(200), Some(endpoint));
        }

        engine.sleep(Duration::from_secs(1));
    }
}
