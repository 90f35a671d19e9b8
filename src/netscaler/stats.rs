//! Statistics snapshot types decoded from NITRO `stat` responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Point-in-time statistics pulled from one appliance.
///
/// Either section may be empty when only part of the fetch succeeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// System-wide counters from `stat/ns`.
    pub global: GlobalStats,
    /// Load-balancing virtual servers from `stat/lbvserver`, keyed by name.
    pub vservers: BTreeMap<String, VServerStats>,
}

impl StatsSnapshot {
    /// Build a snapshot from a global section and a list of virtual servers.
    pub fn new(global: GlobalStats, vservers: impl IntoIterator<Item = VServerStats>) -> Self {
        Self {
            global,
            vservers: vservers
                .into_iter()
                .map(|vs| (vs.name.clone(), vs))
                .collect(),
        }
    }
}

/// Appliance-wide statistics (`stat/ns`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    #[serde(rename = "cpuusagepcnt", default, deserialize_with = "lenient_f64")]
    pub cpu_usage_pcnt: Option<f64>,
    #[serde(rename = "mgmtcpuusagepcnt", default, deserialize_with = "lenient_f64")]
    pub mgmt_cpu_usage_pcnt: Option<f64>,
    #[serde(rename = "memusagepcnt", default, deserialize_with = "lenient_f64")]
    pub mem_usage_pcnt: Option<f64>,
    #[serde(rename = "totrxmbits", default, deserialize_with = "lenient_f64")]
    pub rx_mbits: Option<f64>,
    #[serde(rename = "tottxmbits", default, deserialize_with = "lenient_f64")]
    pub tx_mbits: Option<f64>,
    #[serde(rename = "httptotrequests", default, deserialize_with = "lenient_f64")]
    pub http_requests: Option<f64>,
    #[serde(rename = "httptotresponses", default, deserialize_with = "lenient_f64")]
    pub http_responses: Option<f64>,
    #[serde(rename = "tcpcurclientconn", default, deserialize_with = "lenient_f64")]
    pub tcp_client_conns: Option<f64>,
    #[serde(rename = "tcpcurserverconn", default, deserialize_with = "lenient_f64")]
    pub tcp_server_conns: Option<f64>,
}

/// Per virtual server statistics (`stat/lbvserver`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VServerStats {
    pub name: String,
    /// Reported state, e.g. `UP`, `DOWN`, `OUT OF SERVICE`.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "vslbhealth", default, deserialize_with = "lenient_f64")]
    pub health: Option<f64>,
    #[serde(rename = "actsvcs", default, deserialize_with = "lenient_f64")]
    pub active_services: Option<f64>,
    #[serde(rename = "totalrequests", default, deserialize_with = "lenient_f64")]
    pub requests: Option<f64>,
    #[serde(rename = "totalresponses", default, deserialize_with = "lenient_f64")]
    pub responses: Option<f64>,
    #[serde(rename = "totalrequestbytes", default, deserialize_with = "lenient_f64")]
    pub request_bytes: Option<f64>,
    #[serde(rename = "totalresponsebytes", default, deserialize_with = "lenient_f64")]
    pub response_bytes: Option<f64>,
    #[serde(rename = "curclntconnections", default, deserialize_with = "lenient_f64")]
    pub client_conns: Option<f64>,
    #[serde(rename = "cursrvrconnections", default, deserialize_with = "lenient_f64")]
    pub server_conns: Option<f64>,
}

impl VServerStats {
    /// Create an empty record for the named virtual server.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the appliance reports this virtual server as `UP`.
    pub fn is_up(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("UP"))
    }
}

/// NITRO emits counters as JSON numbers or as numeric strings.
///
/// Anything that does not parse as a number is treated as missing.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        Some(Raw::Other(_)) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_global_stats_accepts_numbers_and_strings() {
        let raw = json!({
            "cpuusagepcnt": 12.5,
            "memusagepcnt": "33.25",
            "httptotrequests": "1024",
            "tcpcurclientconn": "not a number",
            "unrelated": "ignored"
        });

        let stats: GlobalStats = serde_json::from_value(raw).unwrap();
        assert_eq!(stats.cpu_usage_pcnt, Some(12.5));
        assert_eq!(stats.mem_usage_pcnt, Some(33.25));
        assert_eq!(stats.http_requests, Some(1024.0));
        assert_eq!(stats.tcp_client_conns, None);
        assert_eq!(stats.tx_mbits, None);
    }

    #[test]
    fn test_vserver_stats_state() {
        let raw = json!([
            { "name": "web", "state": "UP", "totalrequests": "10" },
            { "name": "api", "state": "DOWN" },
            { "name": "bare" }
        ]);

        let vservers: Vec<VServerStats> = serde_json::from_value(raw).unwrap();
        assert!(vservers[0].is_up());
        assert_eq!(vservers[0].requests, Some(10.0));
        assert!(!vservers[1].is_up());
        assert!(!vservers[2].is_up());
    }

    #[test]
    fn test_snapshot_keys_vservers_by_name() {
        let snapshot = StatsSnapshot::new(
            GlobalStats::default(),
            vec![VServerStats::named("b"), VServerStats::named("a")],
        );

        let names: Vec<_> = snapshot.vservers.keys().cloned().collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
