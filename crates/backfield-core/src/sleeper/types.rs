// Sleeper wire types.
//
// Field names follow the upstream JSON. Sleeper is loose about `null` versus
// missing keys, so every collection is `Option` + `#[serde(default)]` and
// read through an accessor that yields an empty slice.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Users and NFL state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl User {
    /// Display name, falling back to the username when unset.
    pub fn label(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.username.as_deref().filter(|s| !s.is_empty()))
    }
}

/// `/state/nfl`: the upstream's notion of "now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NflState {
    #[serde(default)]
    pub week: u32,
    pub season: String,
    #[serde(default)]
    pub season_type: String,
    #[serde(default)]
    pub previous_season: Option<String>,
    #[serde(default)]
    pub display_week: Option<u32>,
}

impl NflState {
    /// The season before `season`, preferring the upstream's own value.
    pub fn previous_season(&self) -> Option<String> {
        self.previous_season.clone().or_else(|| {
            self.season
                .parse::<u32>()
                .ok()
                .map(|y| (y.saturating_sub(1)).to_string())
        })
    }
}

// ---------------------------------------------------------------------------
// Leagues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueStatus {
    PreDraft,
    Drafting,
    #[serde(alias = "postseason")]
    InSeason,
    Complete,
}

impl LeagueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueStatus::PreDraft => "pre_draft",
            LeagueStatus::Drafting => "drafting",
            LeagueStatus::InSeason => "in_season",
            LeagueStatus::Complete => "complete",
        }
    }

    /// Whether games have started being played for this season.
    pub fn has_games(&self) -> bool {
        matches!(self, LeagueStatus::InSeason | LeagueStatus::Complete)
    }
}

impl fmt::Display for LeagueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub league_id: String,
    pub name: String,
    pub season: String,
    pub status: LeagueStatus,
    #[serde(default)]
    pub previous_league_id: Option<String>,
    #[serde(default)]
    pub total_rosters: Option<u32>,
    #[serde(default)]
    pub settings: LeagueSettings,
    #[serde(default)]
    pub scoring_settings: ScoringSettings,
    #[serde(default)]
    pub roster_positions: Option<Vec<String>>,
}

impl League {
    /// The backward pointer to last season's league. Sleeper uses `null`,
    /// an empty string or `"0"` for "none".
    pub fn previous_league(&self) -> Option<&str> {
        self.previous_league_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != "0")
    }

    pub fn roster_positions(&self) -> &[String] {
        self.roster_positions.as_deref().unwrap_or_default()
    }

    /// Configured lineup slots, in order, excluding bench/reserve/taxi.
    pub fn starting_slots(&self) -> Vec<&str> {
        self.roster_positions()
            .iter()
            .map(String::as_str)
            .filter(|slot| !matches!(*slot, "BN" | "IR" | "TAXI"))
            .collect()
    }
}

/// League-level settings.
///
/// Closed set of fields. Anything upstream sends beyond these is ignored;
/// anything missing takes the default documented on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueSettings {
    /// Number of teams. Default 12.
    pub num_teams: u32,
    /// Teams making the playoffs. Default 6.
    pub playoff_teams: u32,
    /// First week of the playoffs. Default 15.
    pub playoff_week_start: u32,
    /// 0 = one week per round, 1 = two-week championship, 2 = two weeks per
    /// round. Default 0.
    pub playoff_round_type: u32,
    /// Last week trades are allowed; 0 or 99 means no deadline. Default 0.
    pub trade_deadline: u32,
    /// 0 = rolling, 1 = reverse standings, 2 = FAAB. Default 0.
    pub waiver_type: u32,
    /// FAAB budget per team. Default 100.
    pub waiver_budget: u32,
    /// Days a dropped player sits on waivers. Default 2.
    pub waiver_clear_days: u32,
    /// IR slots. Default 0.
    pub reserve_slots: u32,
    /// Taxi squad slots. Default 0.
    pub taxi_slots: u32,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            num_teams: 12,
            playoff_teams: 6,
            playoff_week_start: 15,
            playoff_round_type: 0,
            trade_deadline: 0,
            waiver_type: 0,
            waiver_budget: 100,
            waiver_clear_days: 2,
            reserve_slots: 0,
            taxi_slots: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WaiverType {
    Rolling,
    ReverseStandings,
    Faab,
}

impl LeagueSettings {
    /// Unknown waiver codes read as rolling waivers.
    pub fn waiver_kind(&self) -> WaiverType {
        match self.waiver_type {
            1 => WaiverType::ReverseStandings,
            2 => WaiverType::Faab,
            _ => WaiverType::Rolling,
        }
    }

    pub fn trade_deadline_week(&self) -> Option<u32> {
        match self.trade_deadline {
            0 | 99.. => None,
            week => Some(week),
        }
    }
}

/// Scoring values per stat.
///
/// Closed set of fields; missing ones take Sleeper's standard-scoring
/// defaults listed on each field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    /// Points per passing yard. Default 0.04.
    pub pass_yd: f64,
    /// Default 4.
    pub pass_td: f64,
    /// Default -1.
    pub pass_int: f64,
    /// Default 0.1.
    pub rush_yd: f64,
    /// Default 6.
    pub rush_td: f64,
    /// Points per reception. Default 0.
    pub rec: f64,
    /// Default 0.1.
    pub rec_yd: f64,
    /// Default 6.
    pub rec_td: f64,
    /// Default -2.
    pub fum_lost: f64,
    /// Extra points per tight-end reception. Default 0.
    pub bonus_rec_te: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            pass_yd: 0.04,
            pass_td: 4.0,
            pass_int: -1.0,
            rush_yd: 0.1,
            rush_td: 6.0,
            rec: 0.0,
            rec_yd: 0.1,
            rec_td: 6.0,
            fum_lost: -2.0,
            bonus_rec_te: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ScoringFormat {
    Standard,
    HalfPpr,
    Ppr,
    Custom(f64),
}

impl ScoringSettings {
    pub fn format(&self) -> ScoringFormat {
        if self.rec == 0.0 {
            ScoringFormat::Standard
        } else if (self.rec - 0.5).abs() < f64::EPSILON {
            ScoringFormat::HalfPpr
        } else if (self.rec - 1.0).abs() < f64::EPSILON {
            ScoringFormat::Ppr
        } else {
            ScoringFormat::Custom(self.rec)
        }
    }
}

impl fmt::Display for ScoringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringFormat::Standard => f.write_str("Standard"),
            ScoringFormat::HalfPpr => f.write_str("Half PPR"),
            ScoringFormat::Ppr => f.write_str("PPR"),
            ScoringFormat::Custom(rec) => write!(f, "{rec} per reception"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rosters and matchups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub roster_id: u32,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub co_owners: Option<Vec<String>>,
    #[serde(default)]
    pub players: Option<Vec<String>>,
    #[serde(default)]
    pub starters: Option<Vec<String>>,
    #[serde(default)]
    pub settings: RosterSettings,
}

impl Roster {
    pub fn co_owners(&self) -> &[String] {
        self.co_owners.as_deref().unwrap_or_default()
    }

    pub fn players(&self) -> &[String] {
        self.players.as_deref().unwrap_or_default()
    }

    /// True if `user_id` is the owner or one of the co-owners.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id) || self.co_owners().iter().any(|c| c == user_id)
    }
}

/// Season-to-date totals Sleeper keeps on each roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterSettings {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub fpts: u32,
    pub fpts_decimal: u32,
    pub fpts_against: u32,
    pub fpts_against_decimal: u32,
}

impl RosterSettings {
    pub fn points_for(&self) -> f64 {
        self.fpts as f64 + self.fpts_decimal as f64 / 100.0
    }

    pub fn points_against(&self) -> f64 {
        self.fpts_against as f64 + self.fpts_against_decimal as f64 / 100.0
    }
}

/// One roster's scoring record for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupEntry {
    pub roster_id: u32,
    #[serde(default)]
    pub matchup_id: Option<u32>,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub custom_points: Option<f64>,
    #[serde(default)]
    pub starters: Option<Vec<String>>,
    #[serde(default)]
    pub starters_points: Option<Vec<f64>>,
    #[serde(default)]
    pub players: Option<Vec<String>>,
    #[serde(default)]
    pub players_points: Option<HashMap<String, f64>>,
}

impl MatchupEntry {
    /// Commissioner overrides win over computed points.
    pub fn total_points(&self) -> f64 {
        self.custom_points.or(self.points).unwrap_or(0.0)
    }

    pub fn starters(&self) -> &[String] {
        self.starters.as_deref().unwrap_or_default()
    }

    pub fn players(&self) -> &[String] {
        self.players.as_deref().unwrap_or_default()
    }

    pub fn player_points(&self, player_id: &str) -> Option<f64> {
        self.players_points.as_ref()?.get(player_id).copied()
    }
}

// ---------------------------------------------------------------------------
// Playoff bracket
// ---------------------------------------------------------------------------

/// Where an undetermined bracket slot gets its team from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketFrom {
    /// Winner of match `w`.
    #[serde(default)]
    pub w: Option<u32>,
    /// Loser of match `l`.
    #[serde(default)]
    pub l: Option<u32>,
}

/// One edge of `/league/{id}/winners_bracket`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketEdge {
    #[serde(rename = "r")]
    pub round: u32,
    #[serde(rename = "m")]
    pub match_id: u32,
    #[serde(rename = "t1", default)]
    pub team1: Option<u32>,
    #[serde(rename = "t2", default)]
    pub team2: Option<u32>,
    #[serde(rename = "w", default)]
    pub winner: Option<u32>,
    #[serde(rename = "l", default)]
    pub loser: Option<u32>,
    #[serde(rename = "t1_from", default)]
    pub team1_from: Option<BracketFrom>,
    #[serde(rename = "t2_from", default)]
    pub team2_from: Option<BracketFrom>,
    /// Final placement decided by this game (1 = championship).
    #[serde(rename = "p", default)]
    pub placement: Option<u32>,
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// Entry of the `/players/nfl` directory. Only the fields we render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl PlayerRecord {
    /// Full name, or "first last" for entries (team defenses) without one.
    pub fn name(&self) -> Option<String> {
        if let Some(full) = self.full_name.as_deref().filter(|s| !s.is_empty()) {
            return Some(full.to_string());
        }
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendKind {
    Add,
    Drop,
}

impl TrendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendKind::Add => "add",
            TrendKind::Drop => "drop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingPlayer {
    pub player_id: String,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn league_with_sparse_settings_uses_defaults() {
        let json = r#"{
            "league_id": "1001",
            "name": "Dynasty Bros",
            "season": "2023",
            "status": "complete",
            "previous_league_id": "0",
            "settings": { "playoff_week_start": 14, "waiver_type": 2, "something_new": 7 },
            "scoring_settings": { "rec": 0.5 },
            "roster_positions": ["QB", "RB", "RB", "WR", "FLEX", "BN", "BN", "IR"]
        }"#;
        let league: League = serde_json::from_str(json).unwrap();
        assert_eq!(league.status, LeagueStatus::Complete);
        assert_eq!(league.previous_league(), None);
        assert_eq!(league.settings.playoff_week_start, 14);
        assert_eq!(league.settings.num_teams, 12);
        assert_eq!(league.settings.waiver_budget, 100);
        assert_eq!(league.settings.waiver_kind(), WaiverType::Faab);
        assert_eq!(league.scoring_settings.format(), ScoringFormat::HalfPpr);
        assert!((league.scoring_settings.pass_td - 4.0).abs() < f64::EPSILON);
        assert_eq!(league.starting_slots(), vec!["QB", "RB", "RB", "WR", "FLEX"]);
    }

    #[test]
    fn postseason_status_reads_as_in_season() {
        let status: LeagueStatus = serde_json::from_str("\"postseason\"").unwrap();
        assert_eq!(status, LeagueStatus::InSeason);
    }

    #[test]
    fn roster_tolerates_null_collections() {
        let json = r#"{
            "roster_id": 3,
            "owner_id": "u3",
            "co_owners": null,
            "players": null,
            "settings": { "wins": 9, "fpts": 1500, "fpts_decimal": 42 }
        }"#;
        let roster: Roster = serde_json::from_str(json).unwrap();
        assert!(roster.players().is_empty());
        assert!(roster.co_owners().is_empty());
        assert!(roster.is_owned_by("u3"));
        assert!(!roster.is_owned_by("u4"));
        assert_eq!(roster.settings.wins, 9);
        assert!((roster.settings.points_for() - 1500.42).abs() < 1e-9);
        assert_eq!(roster.settings.points_against(), 0.0);
    }

    #[test]
    fn co_owner_counts_as_owner() {
        let roster = Roster {
            roster_id: 1,
            owner_id: Some("a".into()),
            co_owners: Some(vec!["b".into()]),
            players: None,
            starters: None,
            settings: RosterSettings::default(),
        };
        assert!(roster.is_owned_by("b"));
    }

    #[test]
    fn bracket_edge_decodes_short_keys() {
        let json = r#"{"r":2,"m":3,"t1":null,"t2":null,"w":null,"l":null,
                       "t1_from":{"w":1},"t2_from":{"w":2},"p":1}"#;
        let edge: BracketEdge = serde_json::from_str(json).unwrap();
        assert_eq!(edge.round, 2);
        assert_eq!(edge.match_id, 3);
        assert_eq!(edge.team1, None);
        assert_eq!(edge.team1_from, Some(BracketFrom { w: Some(1), l: None }));
        assert_eq!(edge.placement, Some(1));
    }

    #[test]
    fn custom_points_override_computed_points() {
        let json = r#"{"roster_id":1,"matchup_id":2,"points":101.5,"custom_points":99.0}"#;
        let entry: MatchupEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.total_points(), 99.0);
    }

    #[test]
    fn defense_entries_use_first_and_last_name() {
        let record = PlayerRecord {
            full_name: None,
            first_name: Some("Philadelphia".into()),
            last_name: Some("Eagles".into()),
            team: Some("PHI".into()),
            position: Some("DEF".into()),
        };
        assert_eq!(record.name().as_deref(), Some("Philadelphia Eagles"));
    }

    #[test]
    fn previous_season_falls_back_to_arithmetic() {
        let state = NflState {
            week: 3,
            season: "2024".into(),
            season_type: "regular".into(),
            previous_season: None,
            display_week: None,
        };
        assert_eq!(state.previous_season().as_deref(), Some("2023"));
    }

    #[test]
    fn trade_deadline_sentinels() {
        let mut settings = LeagueSettings::default();
        assert_eq!(settings.trade_deadline_week(), None);
        settings.trade_deadline = 11;
        assert_eq!(settings.trade_deadline_week(), Some(11));
        settings.trade_deadline = 99;
        assert_eq!(settings.trade_deadline_week(), None);
    }
}
