//! Core collector traits and types.

use std::time::Duration;

use thiserror::Error;

use crate::netscaler::StatsSnapshot;

/// Errors that can occur while fetching one section of a target's stats.
///
/// These never fail a collection cycle; they are logged against the target
/// and degrade its contribution.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connection refused, TLS, body read).
    #[error("{section}: request failed: {source}")]
    Http {
        section: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Timeout elapsed.
    #[error("{section}: timed out after {timeout:?}")]
    Timeout {
        section: &'static str,
        timeout: Duration,
    },

    /// Non-success HTTP status.
    #[error("{section}: unexpected HTTP status {status}")]
    Status { section: &'static str, status: u16 },

    /// NITRO reported an error in the response envelope.
    #[error("{section}: NITRO error {errorcode}: {message}")]
    Nitro {
        section: &'static str,
        errorcode: i64,
        message: String,
    },

    /// Response body could not be decoded.
    #[error("{section}: invalid response: {source}")]
    Decode {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that prevent the exporter from being constructed or a scrape from
/// being encoded.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// A target client could not be built from its configuration.
    #[error("failed to instantiate client for '{host}': {source}")]
    Client {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    /// Metric descriptor rejected or exposition failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Two definitions share a metric name.
    #[error("duplicate metric name: '{0}'")]
    DuplicateMetric(String),
}

/// Outcome of one fetch: an optional snapshot plus soft errors.
///
/// `snapshot` is `None` only when nothing could be retrieved; `errors` is
/// then non-empty.
#[derive(Debug, Default)]
pub struct FetchResult {
    pub snapshot: Option<StatsSnapshot>,
    pub errors: Vec<FetchError>,
}

impl FetchResult {
    /// Successful fetch without errors.
    pub fn ok(snapshot: StatsSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            errors: Vec::new(),
        }
    }

    /// Failed fetch with no data.
    pub fn failed(errors: Vec<FetchError>) -> Self {
        Self {
            snapshot: None,
            errors,
        }
    }
}

/// Client for one remote appliance.
///
/// Implementations are shared across concurrent collection cycles, so
/// `fetch` takes `&self`.
#[async_trait::async_trait]
pub trait TargetClient: Send + Sync + 'static {
    /// Host identity used for the `ns_host` label and for logging.
    fn host(&self) -> &str;

    /// Fetch one point-in-time statistics snapshot.
    ///
    /// Never fails outright: transport and protocol problems are reported
    /// in [`FetchResult::errors`].
    async fn fetch(&self) -> FetchResult;
}
