//! Prometheus text exposition.
//!
//! Every scrape gets a fresh [`prometheus::Registry`] built from the schema,
//! so no value survives from one cycle to the next.

use std::collections::HashMap;

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::collector::ExporterError;
use crate::metrics::{MetricDesc, MetricKind, Observation};

/// Content type of the text exposition format.
pub use prometheus::TEXT_FORMAT;

enum Family {
    Gauge(GaugeVec),
    Counter(CounterVec),
}

/// Render one cycle's observations in the Prometheus text format.
///
/// Observations that do not match the schema (unknown metric, wrong label
/// keys, negative counter) are dropped with a warning. Metrics without any
/// observation are omitted from the output.
///
/// # Errors
/// Returns `ExporterError::Metrics` if the schema is invalid or encoding fails.
pub fn encode(
    schema: &[MetricDesc],
    observations: &[Observation],
) -> Result<String, ExporterError> {
    let registry = Registry::new();
    let mut families = HashMap::with_capacity(schema.len());

    for desc in schema {
        let opts = Opts::new(desc.name, desc.help);
        let family = match desc.kind {
            MetricKind::Gauge => {
                let vec = GaugeVec::new(opts, &desc.label_names)?;
                registry.register(Box::new(vec.clone()))?;
                Family::Gauge(vec)
            }
            MetricKind::Counter => {
                let vec = CounterVec::new(opts, &desc.label_names)?;
                registry.register(Box::new(vec.clone()))?;
                Family::Counter(vec)
            }
        };
        families.insert(desc.name, family);
    }

    for obs in observations {
        let Some(family) = families.get(obs.name) else {
            tracing::warn!(metric = obs.name, "Observation for undescribed metric");
            continue;
        };
        let labels: HashMap<&str, &str> = obs
            .labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let recorded = match family {
            Family::Gauge(vec) => vec.get_metric_with(&labels).map(|g| g.set(obs.value)),
            Family::Counter(vec) => {
                if obs.value.is_nan() || obs.value < 0.0 {
                    tracing::warn!(
                        metric = obs.name,
                        value = obs.value,
                        "Dropping negative counter value"
                    );
                    continue;
                }
                vec.get_metric_with(&labels).map(|c| {
                    c.reset();
                    c.inc_by(obs.value);
                })
            }
        };
        if let Err(e) = recorded {
            tracing::warn!(
                metric = obs.name,
                labels = ?obs.labels,
                error = %e,
                "Dropping observation"
            );
        }
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| ExporterError::Metrics(prometheus::Error::Msg(e.to_string())))
}
