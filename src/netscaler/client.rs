//! NITRO REST client.
//!
//! Pulls the `ns` (global) and `lbvserver` stat sections from one appliance
//! concurrently and assembles them into a [`StatsSnapshot`].

use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::collector::{ExporterError, FetchError, FetchResult, TargetClient};
use crate::netscaler::{GlobalStats, StatsSnapshot, VServerStats};

/// Default request timeout (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Global stat section.
pub const SECTION_NS: &str = "ns";

/// Load-balancing virtual server stat section.
pub const SECTION_LBVSERVER: &str = "lbvserver";

const HEADER_NITRO_USER: &str = "X-NITRO-USER";
const HEADER_NITRO_PASS: &str = "X-NITRO-PASS";

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

/// URL scheme used to reach the NITRO API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// Connection settings for one appliance.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Host identity (`host` or `host:port`). Also the `ns_host` label value.
    pub host: String,
    /// URL scheme (default: https).
    #[serde(default)]
    pub scheme: Scheme,
    /// NITRO user name.
    pub username: String,
    /// NITRO password.
    #[serde(skip_serializing)]
    pub password: String,
    /// Per-request timeout (default: 10s).
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Accept invalid TLS certificates (default: false).
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

impl TargetConfig {
    /// Create a new target configuration with default scheme and timeout.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            scheme: Scheme::default(),
            username: username.into(),
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
            insecure_skip_verify: false,
        }
    }

    /// Set the URL scheme.
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Accept invalid TLS certificates.
    pub fn with_insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    /// Base URL of the appliance, e.g. `https://10.0.0.10`.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme.as_str(), self.host)
    }

    /// URL of one NITRO stat section.
    pub fn stat_url(&self, section: &str) -> String {
        format!("{}/nitro/v1/stat/{}", self.base_url(), section)
    }
}

impl std::fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetConfig")
            .field("host", &self.host)
            .field("scheme", &self.scheme)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout", &self.timeout)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .finish()
    }
}

/// Response envelope shared by every NITRO call.
#[derive(Debug, Deserialize)]
struct NitroEnvelope {
    #[serde(default)]
    errorcode: i64,
    #[serde(default)]
    message: String,
    #[serde(flatten)]
    sections: serde_json::Map<String, serde_json::Value>,
}

/// Client for one NetScaler appliance.
pub struct NitroClient {
    config: TargetConfig,
    client: Client,
}

impl NitroClient {
    /// Create a client for the given target.
    ///
    /// # Errors
    /// Returns `ExporterError::Client` if the HTTP client cannot be built.
    pub fn new(config: TargetConfig) -> Result<Self, ExporterError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()
            .map_err(|source| ExporterError::Client {
                host: config.host.clone(),
                source,
            })?;

        Ok(Self { config, client })
    }

    /// Fetch and decode every record of one stat section.
    ///
    /// A section key missing from the response means "no records". NITRO
    /// returns single-record sections either as an object or as a
    /// one-element array.
    async fn fetch_section<T: DeserializeOwned>(
        &self,
        section: &'static str,
    ) -> Result<Vec<T>, FetchError> {
        let request = self
            .client
            .get(self.config.stat_url(section))
            .header(ACCEPT, "application/json")
            .header(HEADER_NITRO_USER, &self.config.username)
            .header(HEADER_NITRO_PASS, &self.config.password);

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match timeout(self.config.timeout, exchange).await {
            Ok(Ok(exchanged)) => exchanged,
            Ok(Err(source)) => return Err(FetchError::Http { section, source }),
            Err(_) => {
                return Err(FetchError::Timeout {
                    section,
                    timeout: self.config.timeout,
                });
            }
        };

        // NITRO reports failures in the envelope, often with a 4xx status.
        let envelope = match serde_json::from_slice::<NitroEnvelope>(&body) {
            Ok(env) if env.errorcode != 0 => {
                return Err(FetchError::Nitro {
                    section,
                    errorcode: env.errorcode,
                    message: env.message,
                });
            }
            _ if !status.is_success() => {
                return Err(FetchError::Status {
                    section,
                    status: status.as_u16(),
                });
            }
            Ok(env) => env,
            Err(source) => return Err(FetchError::Decode { section, source }),
        };

        let decode = |value: serde_json::Value| {
            serde_json::from_value::<T>(value)
                .map_err(|source| FetchError::Decode { section, source })
        };
        let mut sections = envelope.sections;
        match sections.remove(section) {
            None | Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(serde_json::Value::Array(records)) => records.into_iter().map(decode).collect(),
            Some(record) => Ok(vec![decode(record)?]),
        }
    }
}

impl std::fmt::Debug for NitroClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NitroClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl TargetClient for NitroClient {
    fn host(&self) -> &str {
        &self.config.host
    }

    async fn fetch(&self) -> FetchResult {
        let start = Instant::now();
        let (global, vservers) = tokio::join!(
            self.fetch_section::<GlobalStats>(SECTION_NS),
            self.fetch_section::<VServerStats>(SECTION_LBVSERVER),
        );

        let mut errors = Vec::new();
        let global = global.map_err(|e| errors.push(e)).ok();
        let vservers = vservers.map_err(|e| errors.push(e)).ok();

        if global.is_none() && vservers.is_none() {
            tracing::debug!(ns_host = %self.config.host, "No stats retrieved");
            return FetchResult::failed(errors);
        }

        let global = global
            .and_then(|records| records.into_iter().next())
            .unwrap_or_default();
        let snapshot = StatsSnapshot::new(global, vservers.unwrap_or_default());

        tracing::debug!(
            ns_host = %self.config.host,
            vservers = snapshot.vservers.len(),
            soft_errors = errors.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched stats"
        );

        FetchResult {
            snapshot: Some(snapshot),
            errors,
        }
    }
}
