use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use crate::thresholds::parse_threshold_expr;
use crate::{Error, Result};

/// Environment visible to scenario builders.
///
/// Built from the process environment plus `KEY=VALUE` overrides; builders
/// only ever read through this value. Every accessor with a default treats
/// an unset, empty or malformed value as absent and returns the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    vars: BTreeMap<String, String>,
}

impl Env {
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Applies `KEY=VALUE` overrides on top of the current values.
    pub fn with_overrides(mut self, overrides: &[String]) -> Result<Self> {
        for raw in overrides {
            let (k, v) = parse_env_override(raw)?;
            self.vars.insert(k, v);
        }
        Ok(self)
    }

    /// Returns the value for `key`, treating an empty string as unset.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Parses `key` as `T`, falling back to `None` when unset or malformed.
    #[must_use]
    pub fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Positive integer override. Zero counts as unset.
    #[must_use]
    pub fn u64_or(&self, key: &str, default: u64) -> u64 {
        self.parse::<u64>(key)
            .filter(|v| *v > 0)
            .unwrap_or(default)
    }

    #[must_use]
    pub fn duration_or(&self, key: &str, default: Duration) -> Duration {
        self.get(key)
            .and_then(|v| humantime::parse_duration(v.trim()).ok())
            .unwrap_or(default)
    }

    /// Threshold expression override; expressions that do not parse fall back.
    #[must_use]
    pub fn threshold_or(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(v) if parse_threshold_expr(v).is_ok() => v.to_string(),
            Some(v) => {
                tracing::debug!(key, value = v, default, "ignoring malformed threshold override");
                default.to_string()
            }
            None => default.to_string(),
        }
    }
}

fn parse_env_override(s: &str) -> Result<(String, String)> {
    let Some((k, v)) = s.split_once('=') else {
        return Err(Error::InvalidEnvOverride(s.to_string()));
    };
    if k.is_empty() {
        return Err(Error::InvalidEnvOverride(s.to_string()));
    }
    Ok((k.to_string(), v.to_string()))
}
