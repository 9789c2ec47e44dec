pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("metric name must be a non-empty string")]
    InvalidName,

    #[error("metric `{name}` is already registered as {existing}")]
    KindMismatch {
        name: String,
        existing: crate::MetricKind,
    },
}
