pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid base url `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid threshold expression for metric `{metric}`: {error}")]
    InvalidThresholdExpr { metric: String, error: String },

    #[error("`stages` must be a non-empty array of {{ duration, target }}")]
    InvalidStages,

    #[error("invalid --env (expected KEY=VALUE): {0}")]
    InvalidEnvOverride(String),

    #[error("unknown scenario `{0}` (expected `basic`, `api`, `load`, or `stress`)")]
    UnknownScenario(String),

    #[error(transparent)]
    Metrics(#[from] loadkit_metrics::Error),
}
