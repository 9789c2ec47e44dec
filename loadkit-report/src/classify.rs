/// Visual annotation of a reported value. Ordered from best to worst.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    #[default]
    Success,
    Warning,
    Error,
}

/// A fixed cutoff and the status a value earns by crossing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cutoff {
    Above { limit: f64, status: Status },
    Below { limit: f64, status: Status },
}

impl Cutoff {
    pub const P95_DURATION_MS: Self = Self::Above {
        limit: 500.0,
        status: Status::Warning,
    };
    pub const P99_DURATION_MS: Self = Self::Above {
        limit: 1000.0,
        status: Status::Error,
    };
    pub const FAILURE_RATE: Self = Self::Above {
        limit: 0.05,
        status: Status::Error,
    };
    pub const CHECK_PASS_RATE: Self = Self::Below {
        limit: 0.95,
        status: Status::Warning,
    };
    pub const FAILED_CHECKS: Self = Self::Above {
        limit: 0.0,
        status: Status::Error,
    };
}

/// Classifies `value` against `cutoff`. Values on the cutoff are a success.
#[must_use]
pub fn classify(value: f64, cutoff: Cutoff) -> Status {
    match cutoff {
        Cutoff::Above { limit, status } if value > limit => status,
        Cutoff::Below { limit, status } if value < limit => status,
        _ => Status::Success,
    }
}
