// Plain-text rendering of analysis results.

use std::fmt::Write;

use backfield_football::bracket::{BracketNode, BracketReport, SlotSource, TeamRef};
use backfield_football::head_to_head::HeadToHeadRecord;
use backfield_football::matchup::{MatchupDetails, MatchupSide, PlayerSlot};
use backfield_football::settings::SeasonSettings;
use backfield_football::standings::StandingsRow;
use backfield_football::trending::TrendingEntry;
use backfield_football::{MultiYearReport, SeasonResult};

use crate::service::{HeadToHeadReport, LeagueHistory, LineupReview};

/// Render every season with `render_season`, and the non-ready ones with
/// their reason, followed by the missing-season note.
fn multi_year<T>(
    out: &mut String,
    report: &MultiYearReport<T>,
    mut render_season: impl FnMut(&mut String, &T),
) {
    for result in &report.results {
        match result {
            SeasonResult::Ready { season, data } => {
                let _ = writeln!(out, "== {season} ==");
                render_season(out, data);
            }
            SeasonResult::NoData { season, reason } => {
                let _ = writeln!(out, "== {season} ==\n  No data: {reason}");
            }
            SeasonResult::Unavailable { season, error } => {
                let _ = writeln!(out, "== {season} ==\n  Unavailable: {error}");
            }
        }
        out.push('\n');
    }
    if let Some(note) = report.missing_note() {
        let _ = writeln!(out, "{note}");
    }
}

fn player_line(out: &mut String, slot: &PlayerSlot) {
    let detail = match (&slot.position, &slot.team) {
        (Some(pos), Some(team)) => format!(" ({pos}, {team})"),
        (Some(pos), None) => format!(" ({pos})"),
        (None, Some(team)) => format!(" ({team})"),
        (None, None) => String::new(),
    };
    let _ = writeln!(
        out,
        "    {:<5} {:<28} {:>6.2}",
        slot.roster_slot,
        format!("{}{detail}", slot.name),
        slot.points
    );
}

fn side(out: &mut String, label: &str, side: &MatchupSide) {
    let _ = writeln!(out, "  {label}: {} ({:.2})", side.label, side.total_points);
    for slot in &side.starters {
        player_line(out, slot);
    }
    for slot in &side.bench {
        player_line(out, slot);
    }
}

pub fn history(history: &LeagueHistory) -> String {
    let mut out = format!("{} history\n", history.league_name);
    for entry in history.seasons.iter().rev() {
        let _ = writeln!(
            out,
            "  {}  {:<30} {:<10} {}",
            entry.season,
            entry.league_name,
            entry.status.as_str(),
            entry.league_id
        );
    }
    out
}

pub fn matchups(report: &MultiYearReport<MatchupDetails>) -> String {
    let mut out = String::new();
    multi_year(&mut out, report, |out, m| {
        let _ = writeln!(
            out,
            "  Week {} ({}): {:.2} - {:.2}",
            m.week,
            m.status.as_str(),
            m.user.total_points,
            m.opponent.total_points
        );
        side(out, "You", &m.user);
        side(out, "Opponent", &m.opponent);
    });
    out
}

pub fn lineups(report: &MultiYearReport<LineupReview>) -> String {
    let mut out = String::new();
    multi_year(&mut out, report, |out, review| {
        let a = &review.analysis;
        let _ = writeln!(
            out,
            "  Week {}: {:.2} - {:.2}",
            review.matchup.week, review.matchup.user.total_points, review.matchup.opponent.total_points
        );
        if a.optimal_choices {
            let _ = writeln!(out, "  Optimal lineup: no bench player beat your weakest starter.");
            return;
        }
        if let Some(worst) = &a.worst_starter {
            let _ = writeln!(out, "  Weakest starter: {} ({:.2})", worst.name, worst.points);
        }
        let _ = writeln!(out, "  Bench players who outscored them:");
        for slot in &a.outperforming_bench {
            player_line(out, slot);
        }
        let _ = writeln!(out, "  Points left on the bench: {:.2}", a.missed_points);
        if review.could_have_changed_outcome {
            let _ = writeln!(out, "  Those points would have changed the result.");
        }
    });
    out
}

fn team_or_source(team: &Option<TeamRef>, source: &Option<SlotSource>) -> String {
    match (team, source) {
        (Some(team), _) => team.owner.clone(),
        (None, Some(source)) => format!("TBD ({source})"),
        (None, None) => "TBD".to_string(),
    }
}

fn bracket_node(out: &mut String, node: &BracketNode) {
    let t1 = team_or_source(&node.team1, &node.team1_from);
    let t2 = team_or_source(&node.team2, &node.team2_from);
    let result = match &node.winner {
        Some(w) => format!("winner: {}", w.owner),
        None => "pending".to_string(),
    };
    let _ = writeln!(out, "    Game {}: {t1} vs {t2} ({result})", node.match_id);
}

pub fn brackets(report: &MultiYearReport<BracketReport>) -> String {
    let mut out = String::new();
    multi_year(&mut out, report, |out, bracket| {
        let _ = writeln!(out, "  Playoffs {}", bracket.status.as_str());
        for (round, nodes) in &bracket.rounds {
            let _ = writeln!(out, "  Round {round} of {}", bracket.total_rounds);
            for node in nodes {
                bracket_node(out, node);
            }
        }
        if let Some(champion) = bracket.champion() {
            let _ = writeln!(out, "  Champion: {}", champion.owner);
        }
    });
    out
}

fn record_line(record: &HeadToHeadRecord) -> String {
    format!(
        "{} ({:.2} - {:.2})",
        record.summary(),
        record.points_for,
        record.points_against
    )
}

pub fn head_to_head(report: &HeadToHeadReport) -> String {
    let mut out = String::new();
    multi_year(&mut out, &report.seasons, |out, record| {
        let _ = writeln!(out, "  {}", record_line(record));
        for game in &record.games {
            let _ = writeln!(
                out,
                "    Week {:>2}: {:.2} - {:.2}",
                game.week, game.user_points, game.opponent_points
            );
        }
    });
    let _ = writeln!(
        out,
        "All-time vs {}: {}",
        report.opponent,
        record_line(&report.overall)
    );
    out
}

pub fn standings(report: &MultiYearReport<Vec<StandingsRow>>) -> String {
    let mut out = String::new();
    multi_year(&mut out, report, |out, rows| {
        for row in rows {
            let record = if row.ties > 0 {
                format!("{}-{}-{}", row.wins, row.losses, row.ties)
            } else {
                format!("{}-{}", row.wins, row.losses)
            };
            let _ = writeln!(
                out,
                "  {:>2}. {:<28} {:<8} PF {:>8.2}  PA {:>8.2}",
                row.rank, row.owner, record, row.points_for, row.points_against
            );
        }
    });
    out
}

pub fn settings(report: &MultiYearReport<SeasonSettings>) -> String {
    let mut out = String::new();
    multi_year(&mut out, report, |out, s| {
        let deadline = s
            .trade_deadline
            .map(|w| format!("week {w}"))
            .unwrap_or_else(|| "none".to_string());
        let _ = writeln!(out, "  League: {}", s.league_name);
        let _ = writeln!(
            out,
            "  Teams: {} ({} make the playoffs, starting week {}, {})",
            s.teams, s.playoff_teams, s.playoff_week_start, s.playoff_format
        );
        let _ = writeln!(out, "  Scoring: {}", s.scoring);
        let _ = writeln!(
            out,
            "  Waivers: {}, players clear after {} days",
            s.waiver_label(),
            s.waiver_clear_days
        );
        let _ = writeln!(out, "  Trade deadline: {deadline}");
        let _ = writeln!(out, "  Lineup: {}", s.starting_slots.join(", "));
        let _ = writeln!(out, "  IR slots: {}, taxi slots: {}", s.reserve_slots, s.taxi_slots);
    });
    out
}

pub fn trending(entries: &[TrendingEntry]) -> String {
    let mut out = String::new();
    for (i, e) in entries.iter().enumerate() {
        let team = e.team.as_deref().unwrap_or("FA");
        let pos = e.position.as_deref().unwrap_or("?");
        let _ = writeln!(out, "{:>3}. {:<28} {pos:<4} {team:<4} {:>7}", i + 1, e.name, e.count);
    }
    if entries.is_empty() {
        out.push_str("No trending players.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use backfield_football::head_to_head::H2HGame;
    use backfield_football::YearSelection;

    #[test]
    fn multi_year_lists_reasons_and_missing() {
        let selection = YearSelection {
            requested: vec!["2024".into(), "2023".into(), "2019".into()],
            to_process: vec!["2024".into(), "2023".into()],
        };
        let report = MultiYearReport::new(
            &selection,
            vec![
                SeasonResult::no_data("2024", "never played"),
                SeasonResult::unavailable("2023", "upstream returned status 503"),
            ],
        );
        let text = head_to_head(&HeadToHeadReport {
            opponent: "bob".into(),
            seasons: report,
            overall: HeadToHeadRecord::default(),
        });

        assert!(text.contains("No data: never played"));
        assert!(text.contains("Unavailable: upstream returned status 503"));
        assert!(text.contains("No data for: 2019"));
        assert!(text.contains("All-time vs bob: 0-0-0"));
    }

    #[test]
    fn head_to_head_games_are_listed() {
        let record = HeadToHeadRecord::from_games(vec![H2HGame {
            season: "2023".into(),
            week: 4,
            user_points: 101.5,
            opponent_points: 99.0,
        }]);
        let selection = YearSelection {
            requested: vec!["2023".into()],
            to_process: vec!["2023".into()],
        };
        let text = head_to_head(&HeadToHeadReport {
            opponent: "bob".into(),
            overall: record.clone(),
            seasons: MultiYearReport::new(&selection, vec![SeasonResult::ready("2023", record)]),
        });
        assert!(text.contains("1-0-0 (101.50 - 99.00)"));
        assert!(text.contains("Week  4: 101.50 - 99.00"));
    }

    #[test]
    fn pending_bracket_slots_show_source() {
        let node = BracketNode {
            round: 2,
            match_id: 3,
            team1: None,
            team2: Some(TeamRef {
                roster_id: 4,
                owner: "Dana".into(),
            }),
            winner: None,
            loser: None,
            team1_from: Some(SlotSource::WinnerOf(1)),
            team2_from: Some(SlotSource::WinnerOf(2)),
            placement: Some(1),
            is_completed: false,
        };
        let mut out = String::new();
        bracket_node(&mut out, &node);
        assert_eq!(out, "    Game 3: TBD (winner of game 1) vs Dana (pending)\n");
    }

    #[test]
    fn empty_trending_says_so() {
        assert_eq!(trending(&[]), "No trending players.\n");
    }
}
