//! NetScaler Exporter Library
//!
//! Scrape-time Prometheus exporter for NetScaler appliances. Every scrape
//! fans out to all configured targets over the NITRO stats API, tolerates
//! per-target failures, and renders global and per-virtual-server metrics.
//!
//! # Architecture
//!
//! - **Collector**: fan-out/fan-in collection cycle ([`Exporter`])
//! - **Metrics**: declarative metric definitions and schema
//! - **NetScaler**: NITRO client and stats snapshot model
//! - **Exposition**: Prometheus text format rendering
//! - **Server**: HTTP endpoints (`/metrics`, `/healthz`, `/api/describe`)

pub mod collector;
pub mod config;
pub mod exposition;
pub mod metrics;
pub mod netscaler;
pub mod server;

pub use collector::{Exporter, ExporterError, FetchError, FetchResult, TargetClient};
pub use config::{AppConfig, ConfigError};
pub use metrics::{MetricDefinition, MetricDesc, MetricKind, Observation};
pub use netscaler::{NitroClient, Scheme, StatsSnapshot, TargetConfig};
