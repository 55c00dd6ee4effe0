// Weekly matchup resolution.
//
// A week's matchup endpoint is a flat list of scoring entries, one per
// roster; two entries sharing a `matchup_id` played each other. Nothing in it
// names an owner or a player, so everything human-readable is joined in here.

use std::cmp::Ordering;
use std::collections::HashSet;

use backfield_core::players::{describe, PlayerDirectory, PlayerInfo, PlayerMap};
use backfield_core::sleeper::types::{MatchupEntry, NflState};
use backfield_core::{SleeperApi, SleeperError};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::rosters::{fetch_resolved_rosters, find_roster, find_user_roster, ResolvedRoster};

/// Player id Sleeper uses for an unfilled lineup slot.
const EMPTY_SLOT_ID: &str = "0";
/// Lineup slot label for bench players.
pub const BENCH_SLOT: &str = "BN";

#[derive(Debug, Error)]
pub enum MatchupError {
    #[error(transparent)]
    Upstream(#[from] SleeperError),
    #[error("user {user_id} has no roster in league {league_id}")]
    RosterNotFound { user_id: String, league_id: String },
    #[error("roster {roster_id} has no scoring entry for week {week}")]
    EntryNotFound { roster_id: u32, week: u32 },
    #[error("roster {roster_id} has no opponent in week {week}")]
    OpponentNotFound { roster_id: u32, week: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchupStatus {
    Completed,
    InProgress,
    Upcoming,
}

impl MatchupStatus {
    /// Where `(season, week)` sits relative to the upstream's current week.
    /// A different season decides on its own; weeks only matter within the
    /// current season.
    pub fn derive(season: &str, week: u32, now: &NflState) -> Self {
        match compare_seasons(season, &now.season) {
            Ordering::Less => MatchupStatus::Completed,
            Ordering::Greater => MatchupStatus::Upcoming,
            Ordering::Equal => match week.cmp(&now.week) {
                Ordering::Less => MatchupStatus::Completed,
                Ordering::Equal => MatchupStatus::InProgress,
                Ordering::Greater => MatchupStatus::Upcoming,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchupStatus::Completed => "completed",
            MatchupStatus::InProgress => "in progress",
            MatchupStatus::Upcoming => "upcoming",
        }
    }
}

/// Seasons compare numerically when both parse, lexically otherwise.
pub(crate) fn compare_seasons(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSlot {
    pub player_id: String,
    pub name: String,
    pub team: Option<String>,
    pub position: Option<String>,
    pub roster_slot: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupSide {
    pub roster_id: u32,
    pub matchup_id: Option<u32>,
    pub owner: String,
    pub co_owners: Vec<String>,
    /// Owner and co-owners joined for display.
    pub label: String,
    pub total_points: f64,
    /// Lineup-slot order.
    pub starters: Vec<PlayerSlot>,
    pub bench: Vec<PlayerSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupDetails {
    pub season: String,
    pub week: u32,
    pub status: MatchupStatus,
    pub matchup_id: Option<u32>,
    pub user: MatchupSide,
    pub opponent: MatchupSide,
}

impl MatchupDetails {
    /// `Some(true)` if the user outscored the opponent, `None` for a tie.
    pub fn user_won(&self) -> Option<bool> {
        match self.user.total_points.partial_cmp(&self.opponent.total_points) {
            Some(Ordering::Greater) => Some(true),
            Some(Ordering::Less) => Some(false),
            _ => None,
        }
    }
}

fn slot(player_id: &str, roster_slot: &str, points: f64, players: &PlayerMap) -> PlayerSlot {
    let info = if player_id == EMPTY_SLOT_ID {
        PlayerInfo {
            name: "Empty".to_string(),
            team: None,
            position: None,
        }
    } else {
        describe(players, player_id)
    };
    PlayerSlot {
        player_id: player_id.to_string(),
        name: info.name,
        team: info.team,
        position: info.position,
        roster_slot: roster_slot.to_string(),
        points,
    }
}

/// One side of a matchup with every player named and scored.
///
/// Starters are labelled from `starting_slots` in order; a starter beyond
/// the configured slots is labelled `FLEX`. Everyone else on the entry is
/// bench.
pub fn build_side(
    entry: &MatchupEntry,
    roster: &ResolvedRoster,
    starting_slots: &[&str],
    players: &PlayerMap,
) -> MatchupSide {
    let starter_points = entry.starters_points.as_deref().unwrap_or_default();

    let starters: Vec<PlayerSlot> = entry
        .starters()
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let points = starter_points
                .get(i)
                .copied()
                .or_else(|| entry.player_points(id))
                .unwrap_or(0.0);
            let label = starting_slots.get(i).copied().unwrap_or("FLEX");
            slot(id, label, points, players)
        })
        .collect();

    let starting: HashSet<&str> = entry.starters().iter().map(String::as_str).collect();
    let bench = entry
        .players()
        .iter()
        .filter(|id| !starting.contains(id.as_str()))
        .map(|id| slot(id, BENCH_SLOT, entry.player_points(id).unwrap_or(0.0), players))
        .collect();

    MatchupSide {
        roster_id: entry.roster_id,
        matchup_id: entry.matchup_id,
        owner: roster.owner_name.clone(),
        co_owners: roster.co_owner_names.clone(),
        label: roster.display_label(),
        total_points: entry.total_points(),
        starters,
        bench,
    }
}

/// Pair `user_id`'s entry with the entry sharing its `matchup_id`.
///
/// Returns the user's entry first.
pub fn pair_entries<'a>(
    entries: &'a [MatchupEntry],
    roster_id: u32,
    week: u32,
) -> Result<(&'a MatchupEntry, &'a MatchupEntry), MatchupError> {
    let mine = entries
        .iter()
        .find(|e| e.roster_id == roster_id)
        .ok_or(MatchupError::EntryNotFound { roster_id, week })?;
    let matchup_id = mine
        .matchup_id
        .ok_or(MatchupError::OpponentNotFound { roster_id, week })?;
    let theirs = entries
        .iter()
        .find(|e| e.roster_id != roster_id && e.matchup_id == Some(matchup_id))
        .ok_or(MatchupError::OpponentNotFound { roster_id, week })?;
    Ok((mine, theirs))
}

pub struct MatchupResolver<'a> {
    api: &'a dyn SleeperApi,
    players: &'a PlayerDirectory,
}

impl<'a> MatchupResolver<'a> {
    pub fn new(api: &'a dyn SleeperApi, players: &'a PlayerDirectory) -> Self {
        Self { api, players }
    }

    pub async fn resolve(
        &self,
        league_id: &str,
        week: u32,
        user_id: &str,
        season: &str,
    ) -> Result<MatchupDetails, MatchupError> {
        let (entries, rosters, league, now, players) = tokio::join!(
            self.api.matchups(league_id, week),
            fetch_resolved_rosters(self.api, league_id),
            self.api.league(league_id),
            self.api.nfl_state(),
            self.players.get(self.api),
        );
        let (entries, rosters, league, now) = (entries?, rosters?, league?, now?);

        let mine = find_user_roster(&rosters, user_id).ok_or_else(|| MatchupError::RosterNotFound {
            user_id: user_id.to_string(),
            league_id: league_id.to_string(),
        })?;
        let (my_entry, their_entry) = pair_entries(&entries, mine.roster_id(), week)?;
        let theirs = find_roster(&rosters, their_entry.roster_id).ok_or(
            MatchupError::OpponentNotFound {
                roster_id: mine.roster_id(),
                week,
            },
        )?;
        debug!(
            league_id,
            week,
            user_roster = mine.roster_id(),
            opponent_roster = theirs.roster_id(),
            "paired matchup"
        );

        let slots = league.starting_slots();
        Ok(MatchupDetails {
            season: season.to_string(),
            week,
            status: MatchupStatus::derive(season, week, &now),
            matchup_id: my_entry.matchup_id,
            user: build_side(my_entry, mine, &slots, &players),
            opponent: build_side(their_entry, theirs, &slots, &players),
        })
    }
}
