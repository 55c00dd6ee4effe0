// League chain resolution: one league's history across seasons.
//
// Sleeper creates a new league object every season and links it to last
// season's league through `previous_league_id`. Walking that pointer is the
// only way to recover a league's history.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use backfield_core::sleeper::types::{League, LeagueStatus};
use backfield_core::SleeperApi;
use serde::Serialize;
use tracing::{debug, warn};

/// One season of a league chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonEntry {
    pub season: String,
    pub league_id: String,
    pub league_name: String,
    pub status: LeagueStatus,
}

impl SeasonEntry {
    fn from_league(league: &League) -> Self {
        Self {
            season: league.season.clone(),
            league_id: league.league_id.clone(),
            league_name: league.name.clone(),
            status: league.status,
        }
    }
}

/// Season label -> entry, at most one entry per season.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SeasonHistory {
    entries: BTreeMap<String, SeasonEntry>,
}

impl SeasonHistory {
    pub fn get(&self, season: &str) -> Option<&SeasonEntry> {
        self.entries.get(season)
    }

    pub fn seasons(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    /// Entries, oldest season first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SeasonEntry> {
        self.entries.values()
    }

    pub fn latest(&self) -> Option<&SeasonEntry> {
        self.entries.values().next_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns false (and leaves the map untouched) if the season is taken.
    fn insert(&mut self, entry: SeasonEntry) -> bool {
        if self.entries.contains_key(&entry.season) {
            return false;
        }
        self.entries.insert(entry.season.clone(), entry);
        true
    }
}

impl FromIterator<SeasonEntry> for SeasonHistory {
    fn from_iter<I: IntoIterator<Item = SeasonEntry>>(iter: I) -> Self {
        let mut history = SeasonHistory::default();
        for entry in iter {
            history.insert(entry);
        }
        history
    }
}

/// Walk `previous_league_id` back from `current`.
///
/// The pointer chain is upstream data, so the walk stops at the first league
/// or season it has already seen. A failed fetch ends the walk early and the
/// seasons gathered so far are returned.
pub async fn resolve_chain(api: &dyn SleeperApi, current: League) -> SeasonHistory {
    let mut history = SeasonHistory::default();
    let mut visited_leagues = HashSet::new();
    let mut league = current;

    loop {
        if !visited_leagues.insert(league.league_id.clone()) {
            warn!(league_id = %league.league_id, "league chain revisits a league; stopping");
            break;
        }
        if !history.insert(SeasonEntry::from_league(&league)) {
            warn!(
                league_id = %league.league_id,
                season = %league.season,
                "league chain repeats a season; stopping"
            );
            break;
        }
        debug!(league_id = %league.league_id, season = %league.season, "recorded season");

        let Some(previous_id) = league.previous_league().map(str::to_string) else {
            break;
        };
        league = match api.league(&previous_id).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!(league_id = %previous_id, "league chain cut short: {e}");
                break;
            }
        };
    }

    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use backfield_core::sleeper::fake::{league, FakeSleeper};

    fn three_season_chain(api: &FakeSleeper) -> League {
        api.add_league(league("L21", "Dynasty", "2021", LeagueStatus::Complete, None), &[]);
        api.add_league(
            league("L22", "Dynasty", "2022", LeagueStatus::Complete, Some("L21")),
            &[],
        );
        league("L23", "Dynasty II", "2023", LeagueStatus::InSeason, Some("L22"))
    }

    #[tokio::test]
    async fn walks_back_to_first_season() {
        let api = FakeSleeper::new();
        let current = three_season_chain(&api);

        let history = resolve_chain(&api, current).await;

        assert_eq!(history.len(), 3);
        assert_eq!(history.get("2021").unwrap().league_id, "L21");
        assert_eq!(history.get("2023").unwrap().league_name, "Dynasty II");
        assert_eq!(history.latest().unwrap().season, "2023");
        let ids: Vec<&str> = history.iter().map(|e| e.league_id.as_str()).collect();
        assert_eq!(ids, vec!["L21", "L22", "L23"]);
        assert_eq!(api.calls("league"), 2);
    }

    #[tokio::test]
    async fn zero_previous_id_ends_chain() {
        let api = FakeSleeper::new();
        let current = league("L1", "Solo", "2024", LeagueStatus::PreDraft, Some("0"));

        let history = resolve_chain(&api, current).await;

        assert_eq!(history.len(), 1);
        assert_eq!(api.calls("league"), 0);
    }

    #[tokio::test]
    async fn cycle_is_cut() {
        let api = FakeSleeper::new();
        api.add_league(
            league("A", "Loop", "2022", LeagueStatus::Complete, Some("B")),
            &[],
        );
        api.add_league(
            league("B", "Loop", "2021", LeagueStatus::Complete, Some("A")),
            &[],
        );
        let current = league("A", "Loop", "2022", LeagueStatus::Complete, Some("B"));

        let history = resolve_chain(&api, current).await;

        assert_eq!(history.seasons().into_iter().collect::<Vec<_>>(), vec!["2021", "2022"]);
        // One fetch for B, one for A again before the guard trips.
        assert_eq!(api.calls("league"), 2);
    }

    #[tokio::test]
    async fn repeated_season_is_not_recorded_twice() {
        let api = FakeSleeper::new();
        api.add_league(
            league("OLD", "Imposter", "2023", LeagueStatus::Complete, None),
            &[],
        );
        let current = league("NEW", "Real", "2023", LeagueStatus::InSeason, Some("OLD"));

        let history = resolve_chain(&api, current).await;

        assert_eq!(history.len(), 1);
        assert_eq!(history.get("2023").unwrap().league_id, "NEW");
    }

    #[tokio::test]
    async fn failed_fetch_keeps_partial_history() {
        let api = FakeSleeper::new();
        let current = three_season_chain(&api);
        api.fail("league", "L21");

        let history = resolve_chain(&api, current).await;

        assert_eq!(history.seasons().into_iter().collect::<Vec<_>>(), vec!["2022", "2023"]);
    }
}
