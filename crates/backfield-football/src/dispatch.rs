// Fan a per-season analysis out over a season selection.

use std::future::Future;

use serde::Serialize;
use tracing::debug;

use crate::chain::{SeasonEntry, SeasonHistory};
use crate::years::YearSelection;

/// Outcome of one season's analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SeasonResult<T> {
    Ready { season: String, data: T },
    /// The season legitimately has nothing to report (not started, teams
    /// never met, ...).
    NoData { season: String, reason: String },
    /// Something needed for the season could not be fetched or resolved.
    Unavailable { season: String, error: String },
}

impl<T> SeasonResult<T> {
    pub fn ready(season: &str, data: T) -> Self {
        SeasonResult::Ready {
            season: season.to_string(),
            data,
        }
    }

    pub fn no_data(season: &str, reason: impl Into<String>) -> Self {
        SeasonResult::NoData {
            season: season.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(season: &str, error: impl ToString) -> Self {
        SeasonResult::Unavailable {
            season: season.to_string(),
            error: error.to_string(),
        }
    }

    pub fn season(&self) -> &str {
        match self {
            SeasonResult::Ready { season, .. }
            | SeasonResult::NoData { season, .. }
            | SeasonResult::Unavailable { season, .. } => season,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            SeasonResult::Ready { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Run `per_season` for every season in `to_process`, one at a time and in
/// the given order.
///
/// `per_season` reports its own failures through [`SeasonResult`], so a bad
/// season never stops the batch.
pub async fn dispatch_seasons<T, F, Fut>(
    to_process: &[String],
    history: &SeasonHistory,
    mut per_season: F,
) -> Vec<SeasonResult<T>>
where
    F: FnMut(SeasonEntry) -> Fut,
    Fut: Future<Output = SeasonResult<T>>,
{
    let mut results = Vec::with_capacity(to_process.len());
    for season in to_process {
        let Some(entry) = history.get(season) else {
            results.push(SeasonResult::no_data(
                season,
                "season is not part of this league's history",
            ));
            continue;
        };
        debug!(%season, league_id = %entry.league_id, "dispatching season");
        results.push(per_season(entry.clone()).await);
    }
    results
}

/// Ordered per-season results plus the requested seasons that had no league.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiYearReport<T> {
    pub results: Vec<SeasonResult<T>>,
    pub missing_seasons: Vec<String>,
}

impl<T> MultiYearReport<T> {
    pub fn new(selection: &YearSelection, results: Vec<SeasonResult<T>>) -> Self {
        Self {
            results,
            missing_seasons: selection.missing(),
        }
    }

    pub fn ready(&self) -> impl Iterator<Item = (&str, &T)> {
        self.results
            .iter()
            .filter_map(|r| r.data().map(|d| (r.season(), d)))
    }

    /// `"No data for: 2019, 2020"` when any requested season was unknown.
    pub fn missing_note(&self) -> Option<String> {
        (!self.missing_seasons.is_empty())
            .then(|| format!("No data for: {}", self.missing_seasons.join(", ")))
    }
}
