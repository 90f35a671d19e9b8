//! Metric Definitions
//!
//! Declarative metric identities paired with stateless projections from a
//! [`StatsSnapshot`](crate::netscaler::StatsSnapshot) to a value.
//!
//! - [`MetricDefinition`]: identity (name, help, kind, scope) + projection
//! - [`MetricDesc`]: schema entry, available before any network I/O
//! - [`Observation`]: one (metric, label set, value) point from a cycle

mod definitions;
mod types;

pub use definitions::{MetricDefinition, builtin};
pub use types::{
    LABEL_NS_HOST, LABEL_VSERVER, LabelSet, MetricDesc, MetricKind, MetricScope, Observation,
    UpdateFn,
};
