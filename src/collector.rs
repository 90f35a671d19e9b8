//! Collector Layer
//!
//! Scrape-driven collection core. Each scrape runs exactly one cycle that
//! fans out to every configured target in its own Tokio task, waits for all
//! of them, and streams labeled observations through an MPSC channel.
//!
//! # Architecture
//!
//! - [`TargetClient`]: Fetches one stats snapshot from a remote appliance
//! - [`Exporter`]: Owns the clients and metric definitions; `describe` / `collect`
//! - [`FetchError`]: Per-target soft errors, logged and never fatal to a cycle
//!
//! # Example
//!
//! ```rust,no_run
//! use netscaler_exporter::{Exporter, TargetConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let targets = vec![TargetConfig::new("10.0.0.10", "nsroot", "secret")];
//! let exporter = Exporter::from_targets(&targets)?;
//!
//! let schema = exporter.describe();
//! let observations = exporter.collect_all().await;
//! println!("{} metrics, {} observations", schema.len(), observations.len());
//! # Ok(())
//! # }
//! ```

mod exporter;
#[cfg(test)]
pub(crate) mod testing;
mod traits;

pub use exporter::{Exporter, OBSERVATION_CHANNEL_CAPACITY};
pub use traits::{ExporterError, FetchError, FetchResult, TargetClient};
