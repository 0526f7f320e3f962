//! Metric definitions shared across crates.
//!
//! Each crate declares its metrics as `MetricDef` consts and an
//! `ALL_METRICS` table; the binary passes those tables to [`register`]
//! once a recorder is installed so the exporter knows every metric's
//! description up front.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

/// Describe `defs` to the installed recorder. A no-op when no recorder
/// has been set, so callers do not need to guard for test runs.
pub fn register(defs: &[MetricDef]) {
    for def in defs {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
        tracing::debug!(name = def.name, kind = ?def.metric_type, "metric registered");
    }
}

#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        metrics::counter!($def.name)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr) => {
        metrics::histogram!($def.name)
    };
}
