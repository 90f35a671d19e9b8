//! Metric identity, labels and observations.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::netscaler::StatsSnapshot;

/// Label carrying the target host identity. Present on every observation.
pub const LABEL_NS_HOST: &str = "ns_host";

/// Label carrying the virtual server name on vserver-scoped metrics.
pub const LABEL_VSERVER: &str = "vserver";

/// Label values keyed by label name.
pub type LabelSet = BTreeMap<String, String>;

/// Stateless projection of a snapshot onto one value.
///
/// Receives `None` when the target could not be reached at all.
pub type UpdateFn = fn(Option<&StatsSnapshot>, &LabelSet) -> Option<f64>;

/// Prometheus metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a metric is labeled by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricScope {
    /// One series per target.
    Global,
    /// One series per (target, virtual server).
    VServer,
}

impl MetricScope {
    /// Label keys every observation of this scope carries, in exposition order.
    pub fn label_names(&self) -> &'static [&'static str] {
        match self {
            Self::Global => &[LABEL_NS_HOST],
            Self::VServer => &[LABEL_NS_HOST, LABEL_VSERVER],
        }
    }
}

/// Schema entry for one metric, available without any network I/O.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub label_names: Vec<&'static str>,
}

impl MetricDesc {
    /// Convert into a `prometheus` descriptor, validating name and label names.
    ///
    /// # Errors
    /// Returns the `prometheus` error for invalid metric or label names.
    pub fn to_prometheus(&self) -> prometheus::Result<prometheus::core::Desc> {
        prometheus::core::Desc::new(
            self.name.to_string(),
            self.help.to_string(),
            self.label_names.iter().map(|l| l.to_string()).collect(),
            Default::default(),
        )
    }
}

/// One data point emitted by a collection cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub name: &'static str,
    pub kind: MetricKind,
    pub labels: LabelSet,
    pub value: f64,
}

impl Observation {
    /// Label keys of this observation.
    pub fn label_keys(&self) -> Vec<&str> {
        self.labels.keys().map(String::as_str).collect()
    }
}
