// Sleeper API access: wire types, the `SleeperApi` seam and its HTTP client.

pub mod client;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod types;

pub use client::{HttpSleeperClient, SleeperApi, DEFAULT_API_BASE_URL};
