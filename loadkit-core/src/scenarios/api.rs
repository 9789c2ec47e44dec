use std::time::Duration;

use chrono::{DateTime, Utc};
use loadkit_metrics::MetricKind;
use rand::{Rng, RngCore};
use serde_json::json;

use super::{RampDefaults, ScenarioKind, Workload, mins, ramp_stages, scenario_tags};
use crate::Result;
use crate::checks::PerformanceExpectations;
use crate::config::{TestConfig, create_load_test_config};
use crate::engine::{HttpEngine, Request, millis_f64};
use crate::env::Env;
use crate::options::TestOptions;
use crate::reporter::Reporter;
use crate::thresholds::Thresholds;

const ENV_PREFIX: &str = "K6_API_";
const DEFAULT_BASE_URL: &str = "https://reqres.in/api";

pub const ENV_THRESHOLD_LOGIN_SUCCESS_RATE: &str = "K6_THRESHOLD_LOGIN_SUCCESS_RATE";
pub const ENV_THRESHOLD_API_ERRORS: &str = "K6_THRESHOLD_API_ERRORS";
pub const ENV_THRESHOLD_USER_CREATION_TIME: &str = "K6_THRESHOLD_USER_CREATION_TIME";

const API_ERRORS: &str = "api_errors";
const USER_CREATION_TIME: &str = "user_creation_time";
const LOGIN_SUCCESS_RATE: &str = "login_success_rate";

/// User API flow: create, login, list, fetch.
#[derive(Debug)]
pub struct ApiScenario {
    reporter: Reporter,
    config: TestConfig,
    options: TestOptions,
}

impl ApiScenario {
    pub fn new(env: &Env, now: DateTime<Utc>) -> Result<Self> {
        let reporter = Reporter::new("API Load Test")?;
        reporter.add_custom_metric(API_ERRORS, MetricKind::Counter, Some("API error count"))?;
        reporter.add_custom_metric(
            USER_CREATION_TIME,
            MetricKind::Trend,
            Some("User creation response time"),
        )?;
        reporter.add_custom_metric(
            LOGIN_SUCCESS_RATE,
            MetricKind::Rate,
            Some("Login success rate"),
        )?;

        let thresholds = Thresholds::new()
            .with(
                API_ERRORS,
                [env.threshold_or(ENV_THRESHOLD_API_ERRORS, "count<100")],
            )
            .with(
                USER_CREATION_TIME,
                [env.threshold_or(ENV_THRESHOLD_USER_CREATION_TIME, "p(95)<1200")],
            )
            .with(
                LOGIN_SUCCESS_RATE,
                [env.threshold_or(ENV_THRESHOLD_LOGIN_SUCCESS_RATE, "rate>0.8")],
            );

        let base_url = env.string_or(&format!("{ENV_PREFIX}BASE_URL"), DEFAULT_BASE_URL);
        let stages = ramp_stages(
            env,
            ENV_PREFIX,
            RampDefaults {
                ramp_up: mins(2),
                vus: 15,
                steady: mins(5),
                vus_steady: 30,
                ramp_down: mins(2),
            },
        );
        let config = create_load_test_config(&base_url, stages, Some(thresholds), env)?
            .with_tags(scenario_tags(ScenarioKind::Api));
        let options = reporter.test_options(&config, now);

        Ok(Self {
            reporter,
            config,
            options,
        })
    }
}

impl Workload for ApiScenario {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Api
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

        let create = engine.send(
            &Request::post(format!("{base}/users"))
                .json(&json!({
                    "name": format!("testuser_{}", rng.r#gen::<f64>()),
                    "job": "tester",
                }))
                .with_tag("endpoint", "create_user"),
        );
        let created = self.reporter.check_performance(
            &create,
            &PerformanceExpectations::new(201, Duration::from_millis(1200)),
        );
        if created {
            self.reporter
                .record_metric(USER_CREATION_TIME, millis_f64(create.timings.duration), &[]);
        } else {
            self.reporter.record_metric(API_ERRORS, 1.0, &[]);
        }

        let login = engine.send(
            &Request::post(format!("{base}/login"))
                .json(&json!({
                    "email": "eve.holt@reqres.in",
                    "password": "cityslicka",
                }))
                .with_tag("endpoint", "login"),
        );
        let logged_in = self.reporter.check_response(&login, Some(200), Some("login"));
        self.reporter
            .record_metric(LOGIN_SUCCESS_RATE, if logged_in { 1.0 } else { 0.0 }, &[]);

        let list = engine.send(
            &Request::get(format!("{base}/users?page=2")).with_tag("endpoint", "list_users"),
        );
        self.reporter.check_performance(
            &list,
            &PerformanceExpectations::new(200, Duration::from_millis(500)),
        );

        let user =
            engine.send(&Request::get(format!("{base}/users/2")).with_tag("endpoint", "get_user"));
        self.reporter.check_response(&user, Some(200), Some("get_user"));

        engine.sleep(Duration::from_secs_f64(rng.gen_range(1.0..3.0)));
    }
}
