// Shared infrastructure: configuration, upstream API access, player directory.

pub mod config;
pub mod db;
pub mod error;
pub mod players;
pub mod sleeper;

pub use error::SleeperError;
pub use sleeper::SleeperApi;
