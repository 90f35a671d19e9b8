//! Collection core: one fan-out/fan-in cycle per scrape.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::collector::{ExporterError, FetchResult, TargetClient};
use crate::metrics::{
    self, LABEL_NS_HOST, LABEL_VSERVER, LabelSet, MetricDefinition, MetricDesc, MetricScope,
    Observation,
};
use crate::netscaler::{NitroClient, StatsSnapshot, TargetConfig};

/// Capacity of the channel observations are streamed through during a cycle.
pub const OBSERVATION_CHANNEL_CAPACITY: usize = 1024;

/// Fans out to every configured target on each collection cycle and merges
/// the results into labeled observations.
///
/// Targets and metric definitions are fixed at construction. Cycles share
/// nothing but those read-only lists, so concurrent scrapes are safe.
pub struct Exporter {
    clients: Vec<Arc<dyn TargetClient>>,
    metrics: Arc<[MetricDefinition]>,
}

impl Exporter {
    /// Build NITRO clients for `targets` with the built-in metric set.
    ///
    /// # Errors
    /// Fails if any client cannot be instantiated. This is the only error
    /// that stops the exporter from starting.
    pub fn from_targets(targets: &[TargetConfig]) -> Result<Self, ExporterError> {
        let clients = targets
            .iter()
            .map(|target| {
                NitroClient::new(target.clone()).map(|c| Arc::new(c) as Arc<dyn TargetClient>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::with_clients(clients, metrics::builtin())
    }

    /// Build an exporter from arbitrary clients and definitions.
    ///
    /// # Errors
    /// Returns `ExporterError::DuplicateMetric` or `ExporterError::Metrics`
    /// if the definitions do not form a valid schema.
    pub fn with_clients(
        clients: Vec<Arc<dyn TargetClient>>,
        definitions: Vec<MetricDefinition>,
    ) -> Result<Self, ExporterError> {
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert(def.name) {
                return Err(ExporterError::DuplicateMetric(def.name.to_string()));
            }
            def.desc().to_prometheus()?;
        }

        tracing::info!(
            targets = clients.len(),
            metrics = definitions.len(),
            "Exporter initialized"
        );

        Ok(Self {
            clients,
            metrics: definitions.into(),
        })
    }

    /// Host identities of the configured targets.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.clients.iter().map(|c| c.host())
    }

    /// Full metric schema. Performs no I/O.
    pub fn describe(&self) -> Vec<MetricDesc> {
        self.metrics.iter().map(MetricDefinition::desc).collect()
    }

    /// Run one collection cycle, writing observations into `tx`.
    ///
    /// Spawns one task per target and returns once every task has finished.
    /// `tx` and all its clones are dropped by then, so the receiving side
    /// sees the channel close exactly when the cycle is complete.
    ///
    /// Tasks block on `send` while the channel is full, so the receiver must
    /// be drained while this future runs (e.g. under `tokio::join!`, as
    /// [`Exporter::collect_all`] does). Awaiting `collect` first and reading
    /// afterwards deadlocks once a cycle outgrows the channel capacity.
    /// Dropping this future aborts every in-flight target task.
    pub async fn collect(&self, tx: mpsc::Sender<Observation>) {
        let mut tasks = JoinSet::new();

        for client in &self.clients {
            let client = Arc::clone(client);
            let metrics = Arc::clone(&self.metrics);
            let tx = tx.clone();
            tasks.spawn(async move { collect_target(client.as_ref(), &metrics, &tx).await });
        }
        drop(tx);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Target collection task failed");
            }
        }
    }

    /// Run one collection cycle and gather every observation.
    pub async fn collect_all(&self) -> Vec<Observation> {
        let (tx, mut rx) = mpsc::channel(OBSERVATION_CHANNEL_CAPACITY);

        let drain = async {
            let mut observations = Vec::new();
            while let Some(obs) = rx.recv().await {
                observations.push(obs);
            }
            observations
        };

        let start = std::time::Instant::now();
        let ((), observations) = tokio::join!(self.collect(tx), drain);
        tracing::debug!(
            targets = self.clients.len(),
            observations = observations.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Collection cycle complete"
        );
        observations
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("hosts", &self.hosts().collect::<Vec<_>>())
            .field("metric_count", &self.metrics.len())
            .finish_non_exhaustive()
    }
}

/// Fetch one target and project its snapshot through every definition.
async fn collect_target(
    client: &dyn TargetClient,
    metrics: &[MetricDefinition],
    tx: &mpsc::Sender<Observation>,
) {
    let host = client.host();
    let FetchResult { snapshot, errors } = client.fetch().await;
    for err in &errors {
        tracing::warn!(ns_host = %host, error = %err, "Failed to get stats");
    }

    for obs in project(host, snapshot.as_ref(), metrics) {
        if tx.send(obs).await.is_err() {
            tracing::debug!(ns_host = %host, "Observation receiver dropped");
            return;
        }
    }
}

/// Apply every definition to one target's result.
///
/// Vserver-scoped definitions run once per virtual server. Without a
/// snapshot they run once with an empty label set, which never yields an
/// observation.
fn project(
    host: &str,
    snapshot: Option<&StatsSnapshot>,
    metrics: &[MetricDefinition],
) -> Vec<Observation> {
    let mut out = Vec::new();

    for def in metrics {
        match def.scope {
            MetricScope::Global => {
                let labels = LabelSet::from([(LABEL_NS_HOST.to_string(), host.to_string())]);
                out.extend(def.observe(snapshot, labels));
            }
            MetricScope::VServer => match snapshot {
                Some(stats) => {
                    for name in stats.vservers.keys() {
                        let labels = LabelSet::from([
                            (LABEL_NS_HOST.to_string(), host.to_string()),
                            (LABEL_VSERVER.to_string(), name.clone()),
                        ]);
                        out.extend(def.observe(Some(stats), labels));
                    }
                }
                None => out.extend(def.observe(None, LabelSet::new())),
            },
        }
    }

    out
}
