pub mod error;
pub mod metrics;
pub mod registry;
pub mod tags;

pub use error::{Error, Result};
pub use metrics::{MetricHandle, MetricKind, MetricSeriesSummary, MetricValue, TrendSummary};
pub use registry::{MetricDef, MetricId, Registry};
pub use tags::TagSet;
