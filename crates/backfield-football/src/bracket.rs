// Playoff bracket reconstruction.
//
// The winners bracket endpoint returns every playoff game as a flat edge:
// seeded slots carry a roster id, later slots say which earlier game feeds
// them. Consolation games live in the same list and are filtered out here.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use backfield_core::sleeper::types::{BracketEdge, BracketFrom, League, LeagueStatus, NflState};
use backfield_core::{SleeperApi, SleeperError};
use serde::Serialize;
use tracing::warn;

use crate::rosters::{fetch_resolved_rosters, find_roster, ResolvedRoster, UNKNOWN_OWNER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayoffStatus {
    NotStarted,
    InProgress,
    Complete,
}

impl PlayoffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayoffStatus::NotStarted => "not started",
            PlayoffStatus::InProgress => "in progress",
            PlayoffStatus::Complete => "complete",
        }
    }
}

/// Playoff state of `league` given the upstream's current week.
pub fn playoff_status(league: &League, now: &NflState) -> PlayoffStatus {
    match league.status {
        LeagueStatus::PreDraft | LeagueStatus::Drafting => PlayoffStatus::NotStarted,
        LeagueStatus::Complete => PlayoffStatus::Complete,
        LeagueStatus::InSeason
            if league.season == now.season && now.week < league.settings.playoff_week_start =>
        {
            PlayoffStatus::NotStarted
        }
        LeagueStatus::InSeason => PlayoffStatus::InProgress,
    }
}

/// Where a not-yet-known team comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    WinnerOf(u32),
    LoserOf(u32),
}

impl SlotSource {
    fn from_wire(from: &BracketFrom) -> Option<Self> {
        from.w
            .map(SlotSource::WinnerOf)
            .or(from.l.map(SlotSource::LoserOf))
    }
}

impl fmt::Display for SlotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotSource::WinnerOf(m) => write!(f, "winner of game {m}"),
            SlotSource::LoserOf(m) => write!(f, "loser of game {m}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRef {
    pub roster_id: u32,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketNode {
    pub round: u32,
    pub match_id: u32,
    pub team1: Option<TeamRef>,
    pub team2: Option<TeamRef>,
    pub winner: Option<TeamRef>,
    pub loser: Option<TeamRef>,
    pub team1_from: Option<SlotSource>,
    pub team2_from: Option<SlotSource>,
    pub placement: Option<u32>,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketReport {
    pub rounds: BTreeMap<u32, Vec<BracketNode>>,
    pub total_rounds: u32,
    pub status: PlayoffStatus,
}

impl BracketReport {
    pub fn not_started() -> Self {
        Self {
            rounds: BTreeMap::new(),
            total_rounds: 0,
            status: PlayoffStatus::NotStarted,
        }
    }

    /// Winner of the first-place game, once it has been played.
    pub fn champion(&self) -> Option<&TeamRef> {
        self.rounds
            .values()
            .flatten()
            .find(|n| n.placement == Some(1))
            .or_else(|| self.rounds.values().next_back().and_then(|r| r.first()))
            .and_then(|n| n.winner.as_ref())
    }
}

/// Championship path only: round 1, the first-place game, and later games
/// fed by winners of games that are themselves on the path. A game fed by any
/// loser, or decided for a place other than first, is consolation.
fn championship_path(edges: &[BracketEdge]) -> Vec<&BracketEdge> {
    let mut ordered: Vec<&BracketEdge> = edges.iter().collect();
    ordered.sort_by_key(|e| (e.round, e.match_id));

    let mut dropped = BTreeSet::new();
    let mut kept = Vec::with_capacity(ordered.len());
    for edge in ordered {
        let sources = [edge.team1_from, edge.team2_from];
        let fed_by_winner = sources.iter().flatten().any(|f| f.w.is_some());
        let fed_by_loser = sources.iter().flatten().any(|f| f.l.is_some());
        let fed_by_consolation = sources
            .iter()
            .flatten()
            .filter_map(|f| f.w)
            .any(|m| dropped.contains(&m));

        let on_path = match edge.placement {
            Some(1) => true,
            Some(_) => false,
            None => {
                edge.round == 1 || (fed_by_winner && !fed_by_loser && !fed_by_consolation)
            }
        };
        if on_path {
            kept.push(edge);
        } else {
            dropped.insert(edge.match_id);
        }
    }
    kept
}

fn team(rosters: &[ResolvedRoster], roster_id: Option<u32>) -> Option<TeamRef> {
    let roster_id = roster_id?;
    let owner = find_roster(rosters, roster_id)
        .map(ResolvedRoster::display_label)
        .unwrap_or_else(|| UNKNOWN_OWNER.to_string());
    Some(TeamRef { roster_id, owner })
}

pub fn build_bracket(
    edges: &[BracketEdge],
    rosters: &[ResolvedRoster],
    status: PlayoffStatus,
) -> BracketReport {
    let mut rounds: BTreeMap<u32, Vec<BracketNode>> = BTreeMap::new();

    for edge in championship_path(edges) {
        let team1 = team(rosters, edge.team1);
        let team2 = team(rosters, edge.team2);
        let (mut winner, mut loser) = (team(rosters, edge.winner), team(rosters, edge.loser));

        if winner.is_some() && (team1.is_none() || team2.is_none()) {
            warn!(
                round = edge.round,
                match_id = edge.match_id,
                "bracket game has a winner but an undetermined team; ignoring result"
            );
            winner = None;
            loser = None;
        }

        rounds.entry(edge.round).or_default().push(BracketNode {
            round: edge.round,
            match_id: edge.match_id,
            is_completed: winner.is_some(),
            team1,
            team2,
            winner,
            loser,
            team1_from: edge.team1_from.as_ref().and_then(SlotSource::from_wire),
            team2_from: edge.team2_from.as_ref().and_then(SlotSource::from_wire),
            placement: edge.placement,
        });
    }

    for nodes in rounds.values_mut() {
        nodes.sort_by_key(|n| n.match_id);
    }

    BracketReport {
        total_rounds: rounds.keys().next_back().copied().unwrap_or(0),
        rounds,
        status,
    }
}

/// Fetch and build a league's playoff bracket.
///
/// Before the playoffs begin the bracket is reported empty without being
/// built.
pub async fn fetch_bracket(
    api: &dyn SleeperApi,
    league_id: &str,
) -> Result<BracketReport, SleeperError> {
    let (league, now, edges, rosters) = tokio::join!(
        api.league(league_id),
        api.nfl_state(),
        api.winners_bracket(league_id),
        fetch_resolved_rosters(api, league_id),
    );
    let status = playoff_status(&league?, &now?);
    if status == PlayoffStatus::NotStarted {
        return Ok(BracketReport::not_started());
    }
    Ok(build_bracket(&edges?, &rosters?, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backfield_core::sleeper::fake::{league, roster, FakeSleeper};

    fn edge(round: u32, match_id: u32, t1: Option<u32>, t2: Option<u32>, w: Option<u32>) -> BracketEdge {
        BracketEdge {
            round,
            match_id,
            team1: t1,
            team2: t2,
            winner: w,
            loser: match (w, t1, t2) {
                (Some(w), Some(a), Some(b)) => Some(if w == a { b } else { a }),
                _ => None,
            },
            team1_from: None,
            team2_from: None,
            placement: None,
        }
    }

    fn from_winner(m: u32) -> Option<BracketFrom> {
        Some(BracketFrom { w: Some(m), l: None })
    }

    fn from_loser(m: u32) -> Option<BracketFrom> {
        Some(BracketFrom { w: None, l: Some(m) })
    }

    fn rosters() -> Vec<ResolvedRoster> {
        (1..=4)
            .map(|id| ResolvedRoster {
                roster: roster(id, &format!("u{id}"), &[]),
                owner_name: format!("Owner {id}"),
                co_owner_names: Vec::new(),
            })
            .collect()
    }

    fn semifinal_edges() -> Vec<BracketEdge> {
        let mut final_game = edge(2, 3, None, None, None);
        final_game.team1_from = from_winner(1);
        final_game.team2_from = from_winner(2);
        vec![
            edge(1, 1, Some(1), Some(2), Some(1)),
            edge(1, 2, Some(3), Some(4), Some(4)),
            final_game,
        ]
    }

    #[test]
    fn pending_final_shows_feeder_games() {
        let report = build_bracket(&semifinal_edges(), &rosters(), PlayoffStatus::InProgress);

        assert_eq!(report.total_rounds, 2);
        let final_game = &report.rounds[&2][0];
        assert!(final_game.team1.is_none() && final_game.team2.is_none());
        assert_eq!(final_game.team1_from.unwrap().to_string(), "winner of game 1");
        assert_eq!(final_game.team2_from.unwrap().to_string(), "winner of game 2");
        assert!(!final_game.is_completed);

        let semi = &report.rounds[&1][1];
        assert_eq!(semi.winner.as_ref().unwrap().owner, "Owner 4");
        assert_eq!(semi.loser.as_ref().unwrap().roster_id, 3);
        assert!(semi.is_completed);
        assert!(report.champion().is_none());
    }

    #[test]
    fn consolation_games_are_dropped() {
        let mut edges = semifinal_edges();
        let mut third_place = edge(2, 4, Some(2), Some(3), Some(2));
        third_place.team1_from = from_loser(1);
        third_place.team2_from = from_loser(2);
        third_place.placement = Some(3);
        edges.push(third_place);
        let mut final_game = edges[2].clone();
        final_game.team1 = Some(1);
        final_game.team2 = Some(4);
        final_game.winner = Some(4);
        final_game.placement = Some(1);
        edges[2] = final_game;

        let report = build_bracket(&edges, &rosters(), PlayoffStatus::Complete);

        assert_eq!(report.rounds[&2].len(), 1);
        assert_eq!(report.champion().map(|t| t.roster_id), Some(4));
    }

    /// Sleeper's eight-team layout: quarterfinals, winners' semifinals,
    /// losers' semifinals, then games for first, third, fifth and seventh.
    fn eight_team_edges() -> Vec<BracketEdge> {
        let fed = |round, match_id, t1_from, t2_from, placement| {
            let mut e = edge(round, match_id, None, None, None);
            e.team1_from = t1_from;
            e.team2_from = t2_from;
            e.placement = placement;
            e
        };
        vec![
            edge(1, 1, Some(1), Some(8), Some(1)),
            edge(1, 2, Some(4), Some(5), Some(4)),
            edge(1, 3, Some(3), Some(6), Some(3)),
            edge(1, 4, Some(2), Some(7), Some(2)),
            fed(2, 5, from_winner(1), from_winner(2), None),
            fed(2, 6, from_winner(3), from_winner(4), None),
            fed(2, 7, from_loser(1), from_loser(2), None),
            fed(2, 8, from_loser(3), from_loser(4), None),
            fed(3, 9, from_winner(5), from_winner(6), Some(1)),
            fed(3, 10, from_loser(5), from_loser(6), Some(3)),
            fed(3, 11, from_winner(7), from_winner(8), Some(5)),
            fed(3, 12, from_loser(7), from_loser(8), Some(7)),
        ]
    }

    fn match_ids(report: &BracketReport, round: u32) -> Vec<u32> {
        report.rounds[&round].iter().map(|n| n.match_id).collect()
    }

    #[test]
    fn eight_team_bracket_keeps_only_title_path() {
        let report = build_bracket(&eight_team_edges(), &rosters(), PlayoffStatus::InProgress);

        assert_eq!(match_ids(&report, 1), vec![1, 2, 3, 4]);
        assert_eq!(match_ids(&report, 2), vec![5, 6]);
        assert_eq!(match_ids(&report, 3), vec![9]);
        assert_eq!(report.total_rounds, 3);
    }

    #[test]
    fn game_fed_by_consolation_winners_is_dropped() {
        let mut edges = eight_team_edges();
        // Without a placement, the fifth-place game is only recognizable by
        // its feeders.
        edges[10].placement = None;

        let report = build_bracket(&edges, &rosters(), PlayoffStatus::InProgress);

        assert_eq!(match_ids(&report, 3), vec![9]);
    }

    #[test]
    fn winner_without_teams_is_cleared() {
        let mut broken = edge(2, 3, Some(1), None, Some(1));
        broken.team2_from = from_winner(2);
        let report = build_bracket(&[broken], &rosters(), PlayoffStatus::InProgress);

        let node = &report.rounds[&2][0];
        assert!(node.winner.is_none());
        assert!(!node.is_completed);
        assert_eq!(node.team1.as_ref().unwrap().owner, "Owner 1");
    }

    #[test]
    fn unknown_roster_ids_use_sentinel_owner() {
        let report = build_bracket(
            &[edge(1, 1, Some(9), Some(1), None)],
            &rosters(),
            PlayoffStatus::InProgress,
        );
        assert_eq!(report.rounds[&1][0].team1.as_ref().unwrap().owner, UNKNOWN_OWNER);
    }

    fn now(season: &str, week: u32) -> NflState {
        NflState {
            week,
            season: season.into(),
            season_type: "regular".into(),
            previous_season: None,
            display_week: None,
        }
    }

    #[test]
    fn status_follows_league_and_week() {
        let mut l = league("L", "Gang", "2024", LeagueStatus::InSeason, None);
        assert_eq!(playoff_status(&l, &now("2024", 10)), PlayoffStatus::NotStarted);
        assert_eq!(playoff_status(&l, &now("2024", 15)), PlayoffStatus::InProgress);
        l.status = LeagueStatus::Complete;
        assert_eq!(playoff_status(&l, &now("2024", 3)), PlayoffStatus::Complete);
        l.status = LeagueStatus::Drafting;
        assert_eq!(playoff_status(&l, &now("2024", 17)), PlayoffStatus::NotStarted);
    }

    #[tokio::test]
    async fn not_started_short_circuits() {
        let api = FakeSleeper::new();
        api.set_nfl_state("2024", 4);
        api.add_league(league("L", "Gang", "2024", LeagueStatus::InSeason, None), &[]);
        api.set_rosters("L", vec![roster(1, "u1", &[])]);
        api.set_bracket("L", semifinal_edges());

        let report = fetch_bracket(&api, "L").await.unwrap();

        assert_eq!(report, BracketReport::not_started());
    }

    #[tokio::test]
    async fn completed_league_builds_bracket() {
        let api = FakeSleeper::new();
        api.set_nfl_state("2024", 4);
        api.add_user("u1", "alice", "Alice");
        api.add_league(league("L23", "Gang", "2023", LeagueStatus::Complete, None), &[]);
        api.set_rosters("L23", vec![roster(1, "u1", &[])]);
        api.set_bracket("L23", semifinal_edges());

        let report = fetch_bracket(&api, "L23").await.unwrap();

        assert_eq!(report.status, PlayoffStatus::Complete);
        assert_eq!(report.rounds[&1][0].team1.as_ref().unwrap().owner, "Alice");
    }
}
