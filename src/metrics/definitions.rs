//! Metric definitions and the built-in NetScaler metric set.
//!
//! A [`MetricDefinition`] is an immutable identity record plus a plain
//! function pointer. The same instance backs every target's series, so
//! projections must not depend on anything but their arguments.

use crate::metrics::types::{
    LABEL_VSERVER, LabelSet, MetricDesc, MetricKind, MetricScope, Observation, UpdateFn,
};
use crate::netscaler::{StatsSnapshot, VServerStats};

/// Declarative pairing of a metric identity with its projection.
#[derive(Debug, Clone, Copy)]
pub struct MetricDefinition {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub scope: MetricScope,
    pub update: UpdateFn,
}

impl MetricDefinition {
    pub const fn gauge(
        name: &'static str,
        help: &'static str,
        scope: MetricScope,
        update: UpdateFn,
    ) -> Self {
        Self {
            name,
            help,
            kind: MetricKind::Gauge,
            scope,
            update,
        }
    }

    pub const fn counter(
        name: &'static str,
        help: &'static str,
        scope: MetricScope,
        update: UpdateFn,
    ) -> Self {
        Self {
            name,
            help,
            kind: MetricKind::Counter,
            scope,
            update,
        }
    }

    /// Schema entry for this definition.
    pub fn desc(&self) -> MetricDesc {
        MetricDesc {
            name: self.name,
            help: self.help,
            kind: self.kind,
            label_names: self.scope.label_names().to_vec(),
        }
    }

    /// Project `snapshot` for the series identified by `labels`.
    ///
    /// Returns `None` when the projection records nothing or when `labels`
    /// does not have exactly the label keys of this definition's scope.
    pub fn observe(
        &self,
        snapshot: Option<&StatsSnapshot>,
        labels: LabelSet,
    ) -> Option<Observation> {
        let value = (self.update)(snapshot, &labels)?;

        let expected = self.scope.label_names();
        if labels.len() != expected.len() || !expected.iter().all(|k| labels.contains_key(*k)) {
            tracing::debug!(
                metric = self.name,
                labels = ?labels,
                "Dropping value with mismatched label set"
            );
            return None;
        }

        Some(Observation {
            name: self.name,
            kind: self.kind,
            labels,
            value,
        })
    }
}

/// Look up the virtual server a vserver-scoped label set refers to.
fn vserver<'a>(snapshot: &'a StatsSnapshot, labels: &LabelSet) -> Option<&'a VServerStats> {
    snapshot.vservers.get(labels.get(LABEL_VSERVER)?)
}

fn bool_value(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// All built-in metrics, global scope first.
///
/// Absent snapshots: `netscaler_up` records `0`; every other definition
/// records nothing.
pub fn builtin() -> Vec<MetricDefinition> {
    use MetricScope::{Global, VServer};

    vec![
        // --- Global ---
        MetricDefinition::gauge(
            "netscaler_up",
            "Whether the last stats fetch from the appliance returned data (1) or not (0).",
            Global,
            |s, _| Some(bool_value(s.is_some())),
        ),
        MetricDefinition::gauge(
            "netscaler_cpu_usage_percent",
            "Packet engine CPU utilization in percent.",
            Global,
            |s, _| s?.global.cpu_usage_pcnt,
        ),
        MetricDefinition::gauge(
            "netscaler_mgmt_cpu_usage_percent",
            "Management CPU utilization in percent.",
            Global,
            |s, _| s?.global.mgmt_cpu_usage_pcnt,
        ),
        MetricDefinition::gauge(
            "netscaler_memory_usage_percent",
            "Memory utilization in percent.",
            Global,
            |s, _| s?.global.mem_usage_pcnt,
        ),
        MetricDefinition::counter(
            "netscaler_received_megabits_total",
            "Megabits received by the appliance.",
            Global,
            |s, _| s?.global.rx_mbits,
        ),
        MetricDefinition::counter(
            "netscaler_transmitted_megabits_total",
            "Megabits transmitted by the appliance.",
            Global,
            |s, _| s?.global.tx_mbits,
        ),
        MetricDefinition::counter(
            "netscaler_http_requests_total",
            "HTTP requests received.",
            Global,
            |s, _| s?.global.http_requests,
        ),
        MetricDefinition::counter(
            "netscaler_http_responses_total",
            "HTTP responses sent.",
            Global,
            |s, _| s?.global.http_responses,
        ),
        MetricDefinition::gauge(
            "netscaler_tcp_client_connections",
            "Current client TCP connections.",
            Global,
            |s, _| s?.global.tcp_client_conns,
        ),
        MetricDefinition::gauge(
            "netscaler_tcp_server_connections",
            "Current server TCP connections.",
            Global,
            |s, _| s?.global.tcp_server_conns,
        ),
        // --- Virtual servers ---
        MetricDefinition::gauge(
            "netscaler_vserver_up",
            "Whether the virtual server state is UP (1) or not (0).",
            VServer,
            |s, l| Some(bool_value(vserver(s?, l)?.is_up())),
        ),
        MetricDefinition::gauge(
            "netscaler_vserver_health_percent",
            "Percentage of bound services that are UP.",
            VServer,
            |s, l| vserver(s?, l)?.health,
        ),
        MetricDefinition::gauge(
            "netscaler_vserver_active_services",
            "Number of active services bound to the virtual server.",
            VServer,
            |s, l| vserver(s?, l)?.active_services,
        ),
        MetricDefinition::counter(
            "netscaler_vserver_requests_total",
            "Requests received by the virtual server.",
            VServer,
            |s, l| vserver(s?, l)?.requests,
        ),
        MetricDefinition::counter(
            "netscaler_vserver_responses_total",
            "Responses sent by the virtual server.",
            VServer,
            |s, l| vserver(s?, l)?.responses,
        ),
        MetricDefinition::counter(
            "netscaler_vserver_request_bytes_total",
            "Request bytes received by the virtual server.",
            VServer,
            |s, l| vserver(s?, l)?.request_bytes,
        ),
        MetricDefinition::counter(
            "netscaler_vserver_response_bytes_total",
            "Response bytes sent by the virtual server.",
            VServer,
            |s, l| vserver(s?, l)?.response_bytes,
        ),
        MetricDefinition::gauge(
            "netscaler_vserver_client_connections",
            "Current client connections to the virtual server.",
            VServer,
            |s, l| vserver(s?, l)?.client_conns,
        ),
        MetricDefinition::gauge(
            "netscaler_vserver_server_connections",
            "Current connections from the virtual server to backends.",
            VServer,
            |s, l| vserver(s?, l)?.server_conns,
        ),
    ]
}
