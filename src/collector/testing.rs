//! In-memory target clients for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::collector::{FetchError, FetchResult, TargetClient};
use crate::netscaler::StatsSnapshot;

/// How a [`FixtureClient`] answers each fetch.
#[derive(Debug, Clone)]
enum Behavior {
    Healthy(StatsSnapshot),
    /// Snapshot plus one soft error for the global section.
    Partial(StatsSnapshot),
    Unreachable,
}

/// Target client returning canned results after an optional delay.
#[derive(Debug, Clone)]
pub(crate) struct FixtureClient {
    host: String,
    behavior: Behavior,
    delay: Duration,
    fetches: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
}

impl FixtureClient {
    fn new(host: impl Into<String>, behavior: Behavior) -> Self {
        Self {
            host: host.into(),
            behavior,
            delay: Duration::ZERO,
            fetches: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn healthy(host: impl Into<String>, snapshot: StatsSnapshot) -> Self {
        Self::new(host, Behavior::Healthy(snapshot))
    }

    pub(crate) fn partial(host: impl Into<String>, snapshot: StatsSnapshot) -> Self {
        Self::new(host, Behavior::Partial(snapshot))
    }

    pub(crate) fn unreachable(host: impl Into<String>) -> Self {
        Self::new(host, Behavior::Unreachable)
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of fetches started.
    pub(crate) fn fetch_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }

    /// Number of fetches that ran to completion, delay included.
    pub(crate) fn completed_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.completed)
    }
}

#[async_trait::async_trait]
impl TargetClient for FixtureClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn fetch(&self) -> FetchResult {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = match &self.behavior {
            Behavior::Healthy(snapshot) => FetchResult::ok(snapshot.clone()),
            Behavior::Partial(snapshot) => FetchResult {
                snapshot: Some(snapshot.clone()),
                errors: vec![FetchError::Status {
                    section: "ns",
                    status: 503,
                }],
            },
            Behavior::Unreachable => FetchResult::failed(vec![
                FetchError::Timeout {
                    section: "ns",
                    timeout: Duration::from_millis(1),
                },
                FetchError::Timeout {
                    section: "lbvserver",
                    timeout: Duration::from_millis(1),
                },
            ]),
        };

        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}
