// In-memory `SleeperApi` for tests.
//
// Serves canned data, can be told to fail specific requests, and counts calls
// per endpoint so tests can observe caching.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::SleeperApi;
use super::types::{
    BracketEdge, League, LeagueSettings, LeagueStatus, MatchupEntry, NflState, PlayerRecord,
    Roster, RosterSettings, ScoringSettings, TrendKind, TrendingPlayer, User,
};
use crate::error::SleeperError;

#[derive(Default)]
struct FakeState {
    users: HashMap<String, User>,
    user_leagues: HashMap<(String, String), Vec<League>>,
    leagues: HashMap<String, League>,
    rosters: HashMap<String, Vec<Roster>>,
    matchups: HashMap<(String, u32), Vec<MatchupEntry>>,
    brackets: HashMap<String, Vec<BracketEdge>>,
    nfl_state: Option<NflState>,
    trending: HashMap<TrendKind, Vec<TrendingPlayer>>,
    players: HashMap<String, PlayerRecord>,
    failing: HashSet<String>,
}

#[derive(Default)]
pub struct FakeSleeper {
    state: Mutex<FakeState>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FakeSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state mutex poisoned")
    }

    fn record(&self, endpoint: &'static str, key: &str) -> Result<(), SleeperError> {
        *self
            .calls
            .lock()
            .expect("fake calls mutex poisoned")
            .entry(endpoint)
            .or_default() += 1;
        let failing_key = format!("{endpoint}:{key}");
        if self.state().failing.contains(&failing_key) {
            return Err(SleeperError::Status {
                status: 503,
                url: failing_key,
            });
        }
        Ok(())
    }

    /// Number of calls made to `endpoint` (the trait method name).
    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .expect("fake calls mutex poisoned")
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    /// Make `endpoint` fail with a 503 for `key` (the first argument, or `""`
    /// for argument-less endpoints, or `"{league}/{week}"` for matchups).
    pub fn fail(&self, endpoint: &str, key: &str) {
        self.state().failing.insert(format!("{endpoint}:{key}"));
    }

    /// Register a user, reachable by both username and user id.
    pub fn add_user(&self, user_id: &str, username: &str, display_name: &str) {
        let user = User {
            user_id: user_id.to_string(),
            username: Some(username.to_string()),
            display_name: Some(display_name.to_string()),
        };
        let mut state = self.state();
        state.users.insert(username.to_string(), user.clone());
        state.users.insert(user_id.to_string(), user);
    }

    /// Register a league, optionally listing it among `members`' leagues for
    /// its season.
    pub fn add_league(&self, league: League, members: &[&str]) {
        let mut state = self.state();
        for member in members {
            state
                .user_leagues
                .entry((member.to_string(), league.season.clone()))
                .or_default()
                .push(league.clone());
        }
        state.leagues.insert(league.league_id.clone(), league);
    }

    pub fn set_rosters(&self, league_id: &str, rosters: Vec<Roster>) {
        self.state().rosters.insert(league_id.to_string(), rosters);
    }

    pub fn set_matchups(&self, league_id: &str, week: u32, entries: Vec<MatchupEntry>) {
        self.state()
            .matchups
            .insert((league_id.to_string(), week), entries);
    }

    pub fn set_bracket(&self, league_id: &str, edges: Vec<BracketEdge>) {
        self.state().brackets.insert(league_id.to_string(), edges);
    }

    pub fn set_nfl_state(&self, season: &str, week: u32) {
        self.state().nfl_state = Some(NflState {
            week,
            season: season.to_string(),
            season_type: "regular".to_string(),
            previous_season: None,
            display_week: Some(week),
        });
    }

    pub fn set_trending(&self, kind: TrendKind, players: Vec<TrendingPlayer>) {
        self.state().trending.insert(kind, players);
    }

    pub fn add_player(&self, player_id: &str, name: &str, team: Option<&str>, position: &str) {
        self.state().players.insert(
            player_id.to_string(),
            PlayerRecord {
                full_name: Some(name.to_string()),
                first_name: None,
                last_name: None,
                team: team.map(str::to_string),
                position: Some(position.to_string()),
            },
        );
    }
}

#[async_trait]
impl SleeperApi for FakeSleeper {
    async fn user(&self, username_or_id: &str) -> Result<User, SleeperError> {
        self.record("user", username_or_id)?;
        self.state()
            .users
            .get(username_or_id)
            .cloned()
            .ok_or_else(|| SleeperError::not_found(format!("user {username_or_id}")))
    }

    async fn user_leagues(&self, user_id: &str, season: &str) -> Result<Vec<League>, SleeperError> {
        self.record("user_leagues", user_id)?;
        Ok(self
            .state()
            .user_leagues
            .get(&(user_id.to_string(), season.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn league(&self, league_id: &str) -> Result<League, SleeperError> {
        self.record("league", league_id)?;
        self.state()
            .leagues
            .get(league_id)
            .cloned()
            .ok_or_else(|| SleeperError::not_found(format!("league {league_id}")))
    }

    async fn rosters(&self, league_id: &str) -> Result<Vec<Roster>, SleeperError> {
        self.record("rosters", league_id)?;
        self.state()
            .rosters
            .get(league_id)
            .cloned()
            .ok_or_else(|| SleeperError::not_found(format!("rosters for league {league_id}")))
    }

    async fn matchups(&self, league_id: &str, week: u32) -> Result<Vec<MatchupEntry>, SleeperError> {
        self.record("matchups", &format!("{league_id}/{week}"))?;
        Ok(self
            .state()
            .matchups
            .get(&(league_id.to_string(), week))
            .cloned()
            .unwrap_or_default())
    }

    async fn winners_bracket(&self, league_id: &str) -> Result<Vec<BracketEdge>, SleeperError> {
        self.record("winners_bracket", league_id)?;
        Ok(self
            .state()
            .brackets
            .get(league_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn nfl_state(&self) -> Result<NflState, SleeperError> {
        self.record("nfl_state", "")?;
        self.state().nfl_state.clone().ok_or(SleeperError::Status {
            status: 503,
            url: "state/nfl".to_string(),
        })
    }

    async fn trending(
        &self,
        kind: TrendKind,
        _lookback_hours: u32,
        limit: u32,
    ) -> Result<Vec<TrendingPlayer>, SleeperError> {
        self.record("trending", kind.as_str())?;
        let mut players = self
            .state()
            .trending
            .get(&kind)
            .cloned()
            .unwrap_or_default();
        players.truncate(limit as usize);
        Ok(players)
    }

    async fn players(&self) -> Result<HashMap<String, PlayerRecord>, SleeperError> {
        self.record("players", "")?;
        Ok(self.state().players.clone())
    }
}

// ---------------------------------------------------------------------------
// Fixture builders
// ---------------------------------------------------------------------------

/// A league with default settings and a standard starting lineup.
pub fn league(
    league_id: &str,
    name: &str,
    season: &str,
    status: LeagueStatus,
    previous_league_id: Option<&str>,
) -> League {
    League {
        league_id: league_id.to_string(),
        name: name.to_string(),
        season: season.to_string(),
        status,
        previous_league_id: previous_league_id.map(str::to_string),
        total_rosters: Some(4),
        settings: LeagueSettings::default(),
        scoring_settings: ScoringSettings::default(),
        roster_positions: Some(
            ["QB", "RB", "WR", "FLEX", "BN", "BN"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        ),
    }
}

pub fn roster(roster_id: u32, owner_id: &str, players: &[&str]) -> Roster {
    Roster {
        roster_id,
        owner_id: Some(owner_id.to_string()),
        co_owners: None,
        players: Some(players.iter().map(|p| p.to_string()).collect()),
        starters: None,
        settings: RosterSettings::default(),
    }
}

/// A week entry where `starters` score `starter_points` in order and every
/// other player in `players` scores from `bench_points`.
pub fn entry(
    roster_id: u32,
    matchup_id: Option<u32>,
    starters: &[(&str, f64)],
    bench: &[(&str, f64)],
) -> MatchupEntry {
    let total: f64 = starters.iter().map(|(_, p)| p).sum();
    let players_points = starters
        .iter()
        .chain(bench.iter())
        .map(|(id, p)| (id.to_string(), *p))
        .collect();
    MatchupEntry {
        roster_id,
        matchup_id,
        points: Some(total),
        custom_points: None,
        starters: Some(starters.iter().map(|(id, _)| id.to_string()).collect()),
        starters_points: Some(starters.iter().map(|(_, p)| *p).collect()),
        players: Some(
            starters
                .iter()
                .chain(bench.iter())
                .map(|(id, _)| id.to_string())
                .collect(),
        ),
        players_points: Some(players_points),
    }
}

/// A scoring entry that carries only a total (no per-player detail).
pub fn score(roster_id: u32, matchup_id: u32, points: f64) -> MatchupEntry {
    MatchupEntry {
        roster_id,
        matchup_id: Some(matchup_id),
        points: Some(points),
        custom_points: None,
        starters: None,
        starters_points: None,
        players: None,
        players_points: None,
    }
}
