// All-time record between two managers in one league.

use std::cmp::Ordering;

use backfield_core::sleeper::types::{MatchupEntry, NflState};
use backfield_core::SleeperApi;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::debug;

use crate::chain::SeasonEntry;
use crate::dispatch::SeasonResult;
use crate::matchup::compare_seasons;

/// Last week a Sleeper season can schedule games.
pub const FINAL_WEEK: u32 = 18;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct H2HGame {
    pub season: String,
    pub week: u32,
    pub user_points: f64,
    pub opponent_points: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeadToHeadRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: f64,
    pub points_against: f64,
    pub games: Vec<H2HGame>,
}

impl HeadToHeadRecord {
    pub fn from_games(games: Vec<H2HGame>) -> Self {
        let mut record = HeadToHeadRecord::default();
        for game in &games {
            match game.user_points.partial_cmp(&game.opponent_points) {
                Some(Ordering::Greater) => record.wins += 1,
                Some(Ordering::Less) => record.losses += 1,
                _ => record.ties += 1,
            }
            record.points_for += game.user_points;
            record.points_against += game.opponent_points;
        }
        record.games = games;
        record
    }

    /// Merge per-season records, keeping games in the order given.
    pub fn combine<'a>(records: impl IntoIterator<Item = &'a HeadToHeadRecord>) -> Self {
        let games = records
            .into_iter()
            .flat_map(|r| r.games.iter().cloned())
            .collect();
        Self::from_games(games)
    }

    /// `"W-L-T"`.
    pub fn summary(&self) -> String {
        format!("{}-{}-{}", self.wins, self.losses, self.ties)
    }
}

/// Weeks with results worth scanning in `entry`'s season.
///
/// Past seasons scan every week; the current season stops before the week
/// in progress; seasons without games scan nothing.
pub fn weeks_to_scan(entry: &SeasonEntry, now: &NflState) -> Vec<u32> {
    if !entry.status.has_games() {
        return Vec::new();
    }
    match compare_seasons(&entry.season, &now.season) {
        Ordering::Less => (1..=FINAL_WEEK).collect(),
        Ordering::Equal => (1..now.week.min(FINAL_WEEK + 1)).collect(),
        Ordering::Greater => Vec::new(),
    }
}

/// The week's game between two rosters, if they shared a matchup.
fn shared_game(
    season: &str,
    week: u32,
    entries: &[MatchupEntry],
    user_roster: u32,
    opponent_roster: u32,
) -> Option<H2HGame> {
    let mine = entries.iter().find(|e| e.roster_id == user_roster)?;
    let theirs = entries.iter().find(|e| e.roster_id == opponent_roster)?;
    let matchup_id = mine.matchup_id?;
    (theirs.matchup_id == Some(matchup_id)).then(|| H2HGame {
        season: season.to_string(),
        week,
        user_points: mine.total_points(),
        opponent_points: theirs.total_points(),
    })
}

/// One season's record between `user_id` and `opponent_id`.
pub async fn season_head_to_head(
    api: &dyn SleeperApi,
    entry: &SeasonEntry,
    user_id: &str,
    opponent_id: &str,
    now: &NflState,
) -> SeasonResult<HeadToHeadRecord> {
    let season = entry.season.as_str();
    let weeks = weeks_to_scan(entry, now);
    if weeks.is_empty() {
        return SeasonResult::no_data(season, "no games played yet");
    }

    let rosters = match api.rosters(&entry.league_id).await {
        Ok(rosters) => rosters,
        Err(e) => return SeasonResult::unavailable(season, e),
    };
    let Some(user_roster) = rosters.iter().find(|r| r.is_owned_by(user_id)) else {
        return SeasonResult::no_data(season, "user had no team this season");
    };
    let Some(opponent_roster) = rosters.iter().find(|r| r.is_owned_by(opponent_id)) else {
        return SeasonResult::no_data(season, "opponent had no team this season");
    };
    if user_roster.roster_id == opponent_roster.roster_id {
        return SeasonResult::no_data(season, "both managers share one team");
    }

    let fetches = weeks
        .iter()
        .map(|&week| api.matchups(&entry.league_id, week));
    let mut games = Vec::new();
    for (week, result) in weeks.iter().zip(join_all(fetches).await) {
        let entries = match result {
            Ok(entries) => entries,
            Err(e) => return SeasonResult::unavailable(season, format!("week {week}: {e}")),
        };
        games.extend(shared_game(
            season,
            *week,
            &entries,
            user_roster.roster_id,
            opponent_roster.roster_id,
        ));
    }
    debug!(%season, games = games.len(), "head-to-head scan finished");

    if games.is_empty() {
        return SeasonResult::no_data(season, "never played");
    }
    SeasonResult::ready(season, HeadToHeadRecord::from_games(games))
}
