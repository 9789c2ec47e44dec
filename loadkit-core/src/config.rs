use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env::Env;
use crate::thresholds::{Thresholds, format_number};
use crate::{Error, Result};

pub const ENV_THRESHOLD_ERROR_RATE: &str = "K6_THRESHOLD_ERROR_RATE";
pub const ENV_THRESHOLD_P95_DURATION: &str = "K6_THRESHOLD_P95_DURATION";
pub const ENV_THRESHOLD_P99_DURATION: &str = "K6_THRESHOLD_P99_DURATION";

const DEFAULT_ERROR_RATE_THRESHOLD: &str = "rate<0.1";
const DEFAULT_P95_DURATION_MS: u64 = 3000;
const DEFAULT_P99_DURATION_MS: u64 = 5000;
// Used for the `checks` threshold when the error-rate override carries no number.
const FALLBACK_ERROR_RATE: f64 = 0.3;

/// One ramp segment: reach `target` VUs over `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(with = "engine_duration")]
    pub duration: Duration,
    pub target: u64,
}

impl Stage {
    #[must_use]
    pub fn new(duration: Duration, target: u64) -> Self {
        Self { duration, target }
    }
}

/// Configuration record handed to the engine for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    pub base_url: String,
    pub stages: Vec<Stage>,
    pub thresholds: Thresholds,
    pub tags: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vus: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "engine_duration::option"
    )]
    pub duration: Option<Duration>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(rename = "insecureSkipTLSVerify")]
    pub insecure_skip_tls_verify: bool,
}

impl TestConfig {
    /// Replaces the scenario tags.
    #[must_use]
    pub fn with_tags<'a>(mut self, tags: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.tags = tags
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.stages
            .iter()
            .fold(Duration::ZERO, |acc, st| acc.saturating_add(st.duration))
    }
}

/// Builds a ramping load-test configuration.
///
/// When `thresholds` is `None` they are derived from the environment:
/// `K6_THRESHOLD_ERROR_RATE` (default `rate<0.1`),
/// `K6_THRESHOLD_P95_DURATION` / `K6_THRESHOLD_P99_DURATION` (ms, defaults 3000/5000)
/// and a `checks` pass-rate threshold of `1 - error_rate`.
pub fn create_load_test_config(
    base_url: &str,
    stages: Vec<Stage>,
    thresholds: Option<Thresholds>,
    env: &Env,
) -> Result<TestConfig> {
    validate_base_url(base_url)?;
    if stages.is_empty() {
        return Err(Error::InvalidStages);
    }

    let thresholds = match thresholds {
        Some(t) => t,
        None => thresholds_from_env(env),
    };
    thresholds.validate()?;

    Ok(TestConfig {
        base_url: base_url.to_string(),
        stages,
        thresholds,
        tags: BTreeMap::new(),
        vus: Some(1),
        duration: Some(Duration::from_secs(60)),
        env: BTreeMap::from([("BASE_URL".to_string(), base_url.to_string())]),
        insecure_skip_tls_verify: true,
    })
}

/// Builds a stress profile escalating to `max_vus`.
///
/// Stages: 5m to 10% of peak, 10m to 50%, `duration` at peak, 5m ramp-down.
/// Default thresholds are overridden per metric by `custom_thresholds`.
pub fn create_stress_test_config(
    base_url: &str,
    max_vus: u64,
    duration: Duration,
    custom_thresholds: Option<&Thresholds>,
) -> Result<TestConfig> {
    validate_base_url(base_url)?;

    let mut thresholds = Thresholds::new()
        .with("http_req_duration", ["p(95)<1000", "p(99)<2000"])
        .with("http_req_failed", ["rate<0.2"]);
    if let Some(custom) = custom_thresholds {
        thresholds.merge(custom);
    }
    thresholds.validate()?;

    Ok(TestConfig {
        base_url: base_url.to_string(),
        stages: stress_stages(max_vus, duration),
        thresholds,
        tags: BTreeMap::from([
            ("testType".to_string(), "stress".to_string()),
            ("environment".to_string(), "test".to_string()),
        ]),
        vus: None,
        duration: None,
        env: BTreeMap::new(),
        insecure_skip_tls_verify: false,
    })
}

fn stress_stages(max_vus: u64, peak_duration: Duration) -> Vec<Stage> {
    // Integer arithmetic keeps the floor semantics exact.
    vec![
        Stage::new(Duration::from_secs(5 * 60), max_vus / 10),
        Stage::new(Duration::from_secs(10 * 60), max_vus / 2),
        Stage::new(peak_duration, max_vus),
        Stage::new(Duration::from_secs(5 * 60), 0),
    ]
}

fn validate_base_url(base_url: &str) -> Result<()> {
    url::Url::parse(base_url).map_err(|source| Error::InvalidBaseUrl {
        url: base_url.to_string(),
        source,
    })?;
    Ok(())
}

fn thresholds_from_env(env: &Env) -> Thresholds {
    let raw_error_rate = env.get(ENV_THRESHOLD_ERROR_RATE);

    let error_rate_value = raw_error_rate.and_then(error_rate_number);
    let failed_expr = match (raw_error_rate, error_rate_value) {
        // A bare number is shorthand for `rate<N`.
        (Some(raw), Some(v)) if raw.trim().parse::<f64>().is_ok() => {
            format!("rate<{}", format_number(v))
        }
        _ => env.threshold_or(ENV_THRESHOLD_ERROR_RATE, DEFAULT_ERROR_RATE_THRESHOLD),
    };

    let p95 = env.u64_or(ENV_THRESHOLD_P95_DURATION, DEFAULT_P95_DURATION_MS);
    let p99 = env.u64_or(ENV_THRESHOLD_P99_DURATION, DEFAULT_P99_DURATION_MS);
    let checks_rate = 1.0 - error_rate_value.unwrap_or(FALLBACK_ERROR_RATE);

    Thresholds::new()
        .with("http_req_failed", [failed_expr])
        .with(
            "http_req_duration",
            [format!("p(95)<{p95}"), format!("p(99)<{p99}")],
        )
        .with("checks", [format!("rate>{}", format_number(checks_rate))])
}

/// Numeric part of an error-rate override: `0.2`, `rate<0.2` or `rate<=0.2`.
///
/// Other operators do not bound the error rate from above and yield `None`.
fn error_rate_number(raw: &str) -> Option<f64> {
    use crate::thresholds::{ThresholdAgg, ThresholdOp, parse_threshold_expr};

    let raw = raw.trim();
    let number = match raw.parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            let expr = parse_threshold_expr(raw).ok()?;
            if !matches!(expr.agg, ThresholdAgg::Rate)
                || !matches!(expr.op, ThresholdOp::Lt | ThresholdOp::Lte)
            {
                return None;
            }
            expr.value
        }
    };
    (0.0..=1.0).contains(&number).then_some(number)
}

/// Serde helpers writing durations the way the engine parses them (`5m`, `1m30s`, `250ms`).
pub(crate) mod engine_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(d: Duration) -> String {
        let mut out = String::new();
        let mut secs = d.as_secs();
        let millis = d.subsec_millis();

        let hours = secs / 3600;
        secs %= 3600;
        let minutes = secs / 60;
        secs %= 60;

        if hours > 0 {
            out.push_str(&format!("{hours}h"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}m"));
        }
        if secs > 0 {
            out.push_str(&format!("{secs}s"));
        }
        if millis > 0 {
            out.push_str(&format!("{millis}ms"));
        }
        if out.is_empty() {
            out.push_str("0s");
        }
        out
    }

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use std::time::Duration;

        use serde::Serializer;

        pub fn serialize<S: Serializer>(
            d: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match d {
                Some(d) => serializer.serialize_str(&super::format(*d)),
                None => serializer.serialize_none(),
            }
        }
    }
}
