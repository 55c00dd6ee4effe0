// Human-level summary of a season's league settings.

use backfield_core::sleeper::types::{League, ScoringFormat, WaiverType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonSettings {
    pub league_name: String,
    pub teams: u32,
    pub playoff_teams: u32,
    pub playoff_week_start: u32,
    pub playoff_format: &'static str,
    pub scoring: ScoringFormat,
    pub waivers: WaiverType,
    /// Only meaningful for FAAB waivers.
    pub waiver_budget: Option<u32>,
    pub waiver_clear_days: u32,
    pub trade_deadline: Option<u32>,
    pub starting_slots: Vec<String>,
    pub reserve_slots: u32,
    pub taxi_slots: u32,
}

/// Unknown round types read as one week per round.
fn playoff_format(round_type: u32) -> &'static str {
    match round_type {
        1 => "two-week championship",
        2 => "two weeks per round",
        _ => "one week per round",
    }
}

impl SeasonSettings {
    pub fn from_league(league: &League) -> Self {
        let settings = &league.settings;
        let waivers = settings.waiver_kind();
        Self {
            league_name: league.name.clone(),
            teams: league.total_rosters.unwrap_or(settings.num_teams),
            playoff_teams: settings.playoff_teams,
            playoff_week_start: settings.playoff_week_start,
            playoff_format: playoff_format(settings.playoff_round_type),
            scoring: league.scoring_settings.format(),
            waivers,
            waiver_budget: (waivers == WaiverType::Faab).then_some(settings.waiver_budget),
            waiver_clear_days: settings.waiver_clear_days,
            trade_deadline: settings.trade_deadline_week(),
            starting_slots: league
                .starting_slots()
                .into_iter()
                .map(str::to_string)
                .collect(),
            reserve_slots: settings.reserve_slots,
            taxi_slots: settings.taxi_slots,
        }
    }

    /// `"FAAB ($100)"`, `"Rolling"` and so on.
    pub fn waiver_label(&self) -> String {
        match (self.waivers, self.waiver_budget) {
            (WaiverType::Faab, Some(budget)) => format!("FAAB (${budget})"),
            (WaiverType::Faab, None) => "FAAB".to_string(),
            (WaiverType::Rolling, _) => "Rolling".to_string(),
            (WaiverType::ReverseStandings, _) => "Reverse standings".to_string(),
        }
    }
}
