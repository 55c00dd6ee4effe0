// Season standings from roster season-to-date totals.

use std::cmp::Ordering;

use backfield_core::sleeper::types::LeagueStatus;
use serde::Serialize;

use crate::rosters::ResolvedRoster;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsRow {
    pub rank: usize,
    pub roster_id: u32,
    pub owner: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: f64,
    pub points_against: f64,
}

/// Rank rosters by wins, then ties, then points scored.
///
/// `None` before the draft, when every total is zero.
pub fn standings(status: LeagueStatus, rosters: &[ResolvedRoster]) -> Option<Vec<StandingsRow>> {
    if status == LeagueStatus::PreDraft {
        return None;
    }

    let mut rows: Vec<StandingsRow> = rosters
        .iter()
        .map(|r| {
            let totals = &r.roster.settings;
            StandingsRow {
                rank: 0,
                roster_id: r.roster_id(),
                owner: r.display_label(),
                wins: totals.wins,
                losses: totals.losses,
                ties: totals.ties,
                points_for: totals.points_for(),
                points_against: totals.points_against(),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(b.ties.cmp(&a.ties))
            .then(b.points_for.partial_cmp(&a.points_for).unwrap_or(Ordering::Equal))
    });
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    Some(rows)
}
