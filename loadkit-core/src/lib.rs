//! Scenario definitions for a k6-compatible load engine.
//!
//! Configuration builders, threshold handling, response checks and the
//! built-in scenario presets. Execution itself belongs to the engine, reached
//! through [`HttpEngine`].

mod checks;
mod config;
mod engine;
mod env;
mod error;
mod options;
mod reporter;
mod scenarios;
mod thresholds;

pub use checks::{
    CHECKS_METRIC, Check, CheckSet, CheckSink, DEFAULT_MAX_DURATION, PerformanceExpectations,
    Predicate, performance_checks, response_checks,
};
pub use config::{
    ENV_THRESHOLD_ERROR_RATE, ENV_THRESHOLD_P95_DURATION, ENV_THRESHOLD_P99_DURATION, Stage,
    TestConfig, create_load_test_config, create_stress_test_config,
};
pub use engine::{HttpEngine, Method, Request, Response, Timings};
pub use env::Env;
pub use error::{Error, Result};
pub use options::{SUMMARY_TREND_STATS, TestOptions, default_thresholds, test_options};
pub use reporter::Reporter;
pub use scenarios::{
    ApiScenario, BasicScenario, LoadScenario, ScenarioKind, StressScenario, Workload,
    parse_scenario, workload,
};
pub use thresholds::{
    ThresholdAgg, ThresholdExpr, ThresholdOp, Thresholds, format_number, parse_threshold_expr,
};

pub use loadkit_metrics::{MetricKind, MetricValue, Registry};
