//! Built-in scenario presets.
//!
//! Each preset owns a [`Reporter`] with its custom metrics registered, the
//! resolved [`TestConfig`] and engine options, and an iteration function the
//! engine calls once per VU iteration.

mod api;
mod basic;
mod load;
mod stress;

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::RngCore;

use crate::{Error, Result};
use crate::config::{Stage, TestConfig};
use crate::engine::HttpEngine;
use crate::env::Env;
use crate::options::TestOptions;
use crate::reporter::Reporter;

pub use api::ApiScenario;
pub use basic::BasicScenario;
pub use load::LoadScenario;
pub use stress::StressScenario;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum ScenarioKind {
    Basic,
    Api,
    Load,
    Stress,
}

pub trait Workload: Send + Sync {
    fn kind(&self) -> ScenarioKind;

    fn reporter(&self) -> &Reporter;

    fn config(&self) -> &TestConfig;

    fn options(&self) -> &TestOptions;

    /// One VU iteration against `engine`, ending with the preset's think time.
    fn iteration(&self, engine: &dyn HttpEngine, rng: &mut dyn RngCore);

    fn name(&self) -> &str {
        self.reporter().test_name()
    }
}

/// Parses a preset name as written on the command line.
pub fn parse_scenario(name: &str) -> Result<ScenarioKind> {
    name.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| Error::UnknownScenario(name.to_string()))
}

/// Builds the preset for `kind`, reading overrides from `env`.
pub fn workload(kind: ScenarioKind, env: &Env, now: DateTime<Utc>) -> Result<Box<dyn Workload>> {
    tracing::debug!(scenario = %kind, "building scenario preset");
    Ok(match kind {
        ScenarioKind::Basic => Box::new(BasicScenario::new(env, now)?),
        ScenarioKind::Api => Box::new(ApiScenario::new(env, now)?),
        ScenarioKind::Load => Box::new(LoadScenario::new(env, now)?),
        ScenarioKind::Stress => Box::new(StressScenario::new(now)?),
    })
}

/// Three-stage ramp (up, steady, down) read from `{prefix}TEST_*` variables.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RampDefaults {
    pub ramp_up: Duration,
    pub vus: u64,
    pub steady: Duration,
    pub vus_steady: u64,
    pub ramp_down: Duration,
}

pub(crate) fn ramp_stages(env: &Env, prefix: &str, defaults: RampDefaults) -> Vec<Stage> {
    let key = |suffix: &str| format!("{prefix}TEST_{suffix}");
    vec![
        Stage::new(
            env.duration_or(&key("DURATION"), defaults.ramp_up),
            env.u64_or(&key("VUS"), defaults.vus),
        ),
        Stage::new(
            env.duration_or(&key("STEADY_DURATION"), defaults.steady),
            env.u64_or(&key("VUS_STEADY"), defaults.vus_steady),
        ),
        Stage::new(env.duration_or(&key("RAMP_DOWN"), defaults.ramp_down), 0),
    ]
}

pub(crate) fn scenario_tags(kind: ScenarioKind) -> [(&'static str, &'static str); 2] {
    [("testType", kind.into()), ("environment", "test")]
}

pub(crate) fn mins(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}
