//! NetScaler Target Client
//!
//! Talks to one appliance over the NITRO REST API and turns its `stat`
//! sections into a [`StatsSnapshot`].
//!
//! - [`NitroClient`]: [`TargetClient`](crate::collector::TargetClient) over HTTP(S)
//! - [`TargetConfig`]: connection settings for one appliance
//! - [`StatsSnapshot`]: global section + virtual servers keyed by name

mod client;
mod stats;

pub use client::{
    DEFAULT_TIMEOUT, NitroClient, SECTION_LBVSERVER, SECTION_NS, Scheme, TargetConfig,
};
pub use stats::{GlobalStats, StatsSnapshot, VServerStats};
