use std::time::Duration;

use loadkit_metrics::Registry;

use crate::engine::Response;

/// Built-in rate metric every check outcome is recorded to.
pub const CHECKS_METRIC: &str = "checks";

/// Duration ceiling used by [`response_checks`].
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    StatusIs(u16),
    DurationBelow(Duration),
}

impl Predicate {
    #[must_use]
    pub fn holds(&self, response: &Response) -> bool {
        match *self {
            Self::StatusIs(status) => response.status == status,
            Self::DurationBelow(max) => response.timings.duration < max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: String,
    pub predicate: Predicate,
}

/// Receives one outcome per evaluated check.
pub trait CheckSink {
    fn record_check(&self, name: &str, passed: bool);
}

impl CheckSink for Registry {
    fn record_check(&self, name: &str, passed: bool) {
        self.record(
            CHECKS_METRIC,
            if passed { 1.0 } else { 0.0 },
            &[("check", name)],
        );
    }
}

/// Ordered set of named predicates evaluated together against a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSet {
    checks: Vec<Check>,
}

impl CheckSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, predicate: Predicate) -> Self {
        self.checks.push(Check {
            name: name.into(),
            predicate,
        });
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Check> + '_ {
        self.checks.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Evaluates every predicate, reporting each outcome to `sink`.
    ///
    /// Evaluation does not stop at the first failure. Returns `true` when all
    /// predicates hold; an empty set passes.
    pub fn evaluate(&self, response: &Response, sink: &dyn CheckSink) -> bool {
        let mut all = true;
        for check in &self.checks {
            let passed = check.predicate.holds(response);
            sink.record_check(&check.name, passed);
            all &= passed;
        }
        all
    }
}

/// Status and 3s latency checks, named after the request.
#[must_use]
pub fn response_checks(expected_status: u16, name: &str) -> CheckSet {
    CheckSet::new()
        .with(
            format!("{name} status is {expected_status}"),
            Predicate::StatusIs(expected_status),
        )
        .with(
            format!(
                "{name} response time < {}ms",
                DEFAULT_MAX_DURATION.as_millis()
            ),
            Predicate::DurationBelow(DEFAULT_MAX_DURATION),
        )
}

/// Caller-chosen expectations; only the fields that are set become checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformanceExpectations {
    pub expected_status: Option<u16>,
    pub max_duration: Option<Duration>,
}

impl PerformanceExpectations {
    #[must_use]
    pub fn new(expected_status: u16, max_duration: Duration) -> Self {
        Self {
            expected_status: Some(expected_status),
            max_duration: Some(max_duration),
        }
    }
}

#[must_use]
pub fn performance_checks(expectations: &PerformanceExpectations) -> CheckSet {
    let mut set = CheckSet::new();
    if let Some(status) = expectations.expected_status {
        set = set.with(format!("status is {status}"), Predicate::StatusIs(status));
    }
    if let Some(max) = expectations.max_duration {
        set = set.with(
            format!("response time < {}ms", max.as_millis()),
            Predicate::DurationBelow(max),
        );
    }
    set
}
