use dashmap::DashMap;
use parking_lot::RwLock;

use crate::metrics::{MetricHandle, MetricKind, MetricSeriesSummary, MetricStorage};
use crate::tags::TagSet;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricId(u32);

#[derive(Debug, Clone)]
pub struct MetricDef {
    pub name: String,
    pub kind: MetricKind,
    pub description: Option<String>,
}

/// Name-keyed metric registry.
///
/// A registry is an ordinary value owned by whoever records into it; there is
/// no process-wide instance. Recording against a name that was never
/// registered is a silent no-op.
#[derive(Debug, Default)]
pub struct Registry {
    defs: RwLock<Vec<MetricDef>>,
    storage: DashMap<MetricId, DashMap<TagSet, MetricStorage>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` as a metric of `kind`.
    ///
    /// Registering the same name again with the same kind returns the existing
    /// id (the first description is kept).
    pub fn register(
        &self,
        name: &str,
        kind: MetricKind,
        description: Option<&str>,
    ) -> Result<MetricId> {
        if name.trim().is_empty() {
            return Err(Error::InvalidName);
        }

        let mut defs = self.defs.write();
        if let Some((idx, def)) = defs.iter().enumerate().find(|(_, d)| d.name == name) {
            if def.kind != kind {
                return Err(Error::KindMismatch {
                    name: name.to_string(),
                    existing: def.kind,
                });
            }
            return Ok(MetricId(idx as u32));
        }

        let id = MetricId(defs.len() as u32);
        defs.push(MetricDef {
            name: name.to_string(),
            kind,
            description: description.map(str::to_string),
        });
        self.storage.insert(id, DashMap::new());
        Ok(id)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<MetricId> {
        let defs = self.defs.read();
        defs.iter()
            .position(|d| d.name == name)
            .map(|idx| MetricId(idx as u32))
    }

    #[must_use]
    pub fn definition(&self, metric: MetricId) -> Option<MetricDef> {
        self.defs.read().get(metric.0 as usize).cloned()
    }

    #[must_use]
    pub fn definitions(&self) -> Vec<MetricDef> {
        self.defs.read().clone()
    }

    /// Returns the series handle for `tags`, creating the series on first use.
    pub fn get_handle(&self, metric: MetricId, tags: TagSet) -> Option<MetricHandle> {
        // Lock order is `defs` then `storage`, as in `register`; the defs guard
        // is released before any storage shard is touched.
        let kind = self.defs.read().get(metric.0 as usize)?.kind;

        let series_map = self.storage.get(&metric)?;

        if let Some(storage) = series_map.get(&tags) {
            return Some(storage.value().handle());
        }

        let handle = series_map
            .entry(tags)
            .or_insert_with(|| MetricStorage::new(kind))
            .handle();

        Some(handle)
    }

    /// Records `value` for the metric registered as `name`.
    ///
    /// Unknown names are ignored.
    pub fn record(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        let Some(metric) = self.lookup(name) else {
            return;
        };

        if let Some(handle) = self.get_handle(metric, TagSet::from_pairs(tags.iter().copied())) {
            handle.add(value);
        }
    }

    pub fn summarize(&self) -> Vec<MetricSeriesSummary> {
        let mut out = Vec::new();
        let defs = self.defs.read();

        for entry in self.storage.iter() {
            let metric_id = entry.key();
            let series_map = entry.value();

            let Some(def) = defs.get(metric_id.0 as usize) else {
                continue;
            };

            for series in series_map.iter() {
                out.push(MetricSeriesSummary {
                    name: def.name.clone(),
                    kind: def.kind,
                    tags: series.key().to_vec(),
                    values: series.value().value(),
                });
            }
        }

        out.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.tags.cmp(&b.tags)));
        out
    }
}
