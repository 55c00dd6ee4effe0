// Fantasy-football analytics over the Sleeper API: league history across
// seasons and the per-season analyses run against it.

pub mod bracket;
pub mod chain;
pub mod dispatch;
pub mod head_to_head;
pub mod identity;
pub mod lineup;
pub mod matchup;
pub mod rosters;
pub mod settings;
pub mod standings;
pub mod trending;
pub mod years;

pub use chain::{resolve_chain, SeasonEntry, SeasonHistory};
pub use dispatch::{dispatch_seasons, MultiYearReport, SeasonResult};
pub use identity::{IdentityCache, IdentityResolver};
pub use years::{parse_years, YearRangeError, YearSelection};
