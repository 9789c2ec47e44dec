use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Indicator kind, named the way test scripts and the engine spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MetricKind {
    /// Cumulative total.
    Counter,
    /// Last observed value.
    Gauge,
    /// Proportion of non-zero observations.
    Rate,
    /// Distribution of observed values (milliseconds for timings).
    Trend,
}

#[derive(Debug, Clone)]
pub struct MetricSeriesSummary {
    pub name: String,
    pub kind: MetricKind,
    pub tags: Vec<(String, String)>,
    pub values: MetricValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Counter(f64),
    Gauge(f64),
    Rate {
        total: u64,
        hits: u64,
        rate: Option<f64>,
    },
    Trend(TrendSummary),
}

/// Trend statistics in the engine's `summaryTrendStats` order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSummary {
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub med: Option<f64>,
    pub max: Option<f64>,
    pub p90: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
    pub count: u64,
}

const MICROS_PER_MS: f64 = 1_000.0;

pub(crate) fn new_default_histogram() -> Histogram<u64> {
    // Trend values are stored in microseconds.
    // Upper bound: 1 hour in microseconds.
    match Histogram::<u64>::new_with_bounds(1, 3_600_000_000, 3) {
        Ok(h) => h,
        Err(err) => panic!("failed to create histogram: {err}"),
    }
}

pub(crate) fn summarize_histogram(h: &Histogram<u64>) -> TrendSummary {
    let count = h.len();
    let to_ms = |v: u64| v as f64 / MICROS_PER_MS;

    TrendSummary {
        avg: (count > 0).then(|| h.mean() / MICROS_PER_MS),
        min: (count > 0).then(|| to_ms(h.min())),
        med: (count > 0).then(|| to_ms(h.value_at_quantile(0.50))),
        max: (count > 0).then(|| to_ms(h.max())),
        p90: (count > 0).then(|| to_ms(h.value_at_quantile(0.90))),
        p95: (count > 0).then(|| to_ms(h.value_at_quantile(0.95))),
        p99: (count > 0).then(|| to_ms(h.value_at_quantile(0.99))),
        count,
    }
}

/// `f64` stored as raw bits so counters and gauges stay lock-free.
#[derive(Debug, Default)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn add(&self, value: f64) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + value).to_bits())
            });
    }
}

#[derive(Debug, Default)]
pub struct Rate {
    pub total: AtomicU64,
    pub hits: AtomicU64,
}

#[derive(Debug)]
pub enum MetricStorage {
    Counter(Arc<AtomicF64>),
    Gauge(Arc<AtomicF64>),
    Rate(Arc<Rate>),
    Trend(Arc<Mutex<Histogram<u64>>>),
}

impl MetricStorage {
    pub fn new(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Counter => MetricStorage::Counter(Arc::new(AtomicF64::default())),
            MetricKind::Gauge => MetricStorage::Gauge(Arc::new(AtomicF64::default())),
            MetricKind::Rate => MetricStorage::Rate(Arc::new(Rate::default())),
            MetricKind::Trend => MetricStorage::Trend(Arc::new(Mutex::new(new_default_histogram()))),
        }
    }

    pub(crate) fn handle(&self) -> MetricHandle {
        match self {
            MetricStorage::Counter(a) => MetricHandle::Counter(a.clone()),
            MetricStorage::Gauge(a) => MetricHandle::Gauge(a.clone()),
            MetricStorage::Rate(a) => MetricHandle::Rate(a.clone()),
            MetricStorage::Trend(a) => MetricHandle::Trend(a.clone()),
        }
    }

    pub(crate) fn value(&self) -> MetricValue {
        match self {
            MetricStorage::Counter(a) => MetricValue::Counter(a.load()),
            MetricStorage::Gauge(a) => MetricValue::Gauge(a.load()),
            MetricStorage::Rate(r) => {
                let total = r.total.load(Ordering::Relaxed);
                let hits = r.hits.load(Ordering::Relaxed);
                let rate = (total > 0).then(|| hits as f64 / total as f64);
                MetricValue::Rate { total, hits, rate }
            }
            MetricStorage::Trend(h) => MetricValue::Trend(summarize_histogram(&h.lock())),
        }
    }
}

// Public handle for writing metrics
#[derive(Debug, Clone)]
pub enum MetricHandle {
    Counter(Arc<AtomicF64>),
    Gauge(Arc<AtomicF64>),
    Rate(Arc<Rate>),
    Trend(Arc<Mutex<Histogram<u64>>>),
}

impl MetricHandle {
    #[must_use]
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricHandle::Counter(_) => MetricKind::Counter,
            MetricHandle::Gauge(_) => MetricKind::Gauge,
            MetricHandle::Rate(_) => MetricKind::Rate,
            MetricHandle::Trend(_) => MetricKind::Trend,
        }
    }

    /// Record one observation with the semantics of the handle's kind.
    ///
    /// Rates count any non-zero value as a hit. Trends ignore negative or
    /// non-finite values.
    pub fn add(&self, value: f64) {
        match self {
            MetricHandle::Counter(c) => c.add(value),
            MetricHandle::Gauge(g) => g.store(value),
            MetricHandle::Rate(r) => {
                if value != 0.0 {
                    r.hits.fetch_add(1, Ordering::Relaxed);
                }
                r.total.fetch_add(1, Ordering::Relaxed);
            }
            MetricHandle::Trend(h) => {
                if value.is_finite() && value >= 0.0 {
                    let micros = (value * MICROS_PER_MS).round() as u64;
                    h.lock().saturating_record(micros);
                }
            }
        }
    }

    pub fn add_bool(&self, value: bool) {
        self.add(if value { 1.0 } else { 0.0 });
    }
}
