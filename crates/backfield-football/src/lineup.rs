// Bench-vs-starters lineup review.
//
// Greedy single-swap heuristic: any bench player who outscored the worst
// starter counts as a missed opportunity. Position eligibility is ignored.

use std::cmp::Ordering;

use serde::Serialize;

use crate::matchup::{MatchupSide, PlayerSlot};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupAnalysis {
    /// Ascending by points.
    pub starters: Vec<PlayerSlot>,
    /// Descending by points.
    pub bench: Vec<PlayerSlot>,
    pub worst_starter: Option<PlayerSlot>,
    pub outperforming_bench: Vec<PlayerSlot>,
    pub missed_points: f64,
    pub optimal_choices: bool,
}

fn by_points(a: &PlayerSlot, b: &PlayerSlot) -> Ordering {
    a.points.partial_cmp(&b.points).unwrap_or(Ordering::Equal)
}

pub fn analyze(side: &MatchupSide) -> LineupAnalysis {
    let mut starters = side.starters.clone();
    starters.sort_by(by_points);
    let mut bench = side.bench.clone();
    bench.sort_by(|a, b| by_points(b, a));

    let worst_starter = starters.first().cloned();
    let outperforming_bench: Vec<PlayerSlot> = match &worst_starter {
        Some(worst) => bench
            .iter()
            .filter(|p| p.points > worst.points)
            .cloned()
            .collect(),
        None => Vec::new(),
    };
    let missed_points = match &worst_starter {
        Some(worst) => outperforming_bench
            .iter()
            .map(|p| p.points - worst.points)
            .sum(),
        None => 0.0,
    };

    LineupAnalysis {
        optimal_choices: outperforming_bench.is_empty(),
        starters,
        bench,
        worst_starter,
        outperforming_bench,
        missed_points,
    }
}

/// Whether the missed points alone would have flipped the result.
///
/// A loss flips if `score + missed` beats the opponent; a win flips if
/// `score - missed` falls below it. Ties never flip.
pub fn could_have_changed_outcome(
    side: &MatchupSide,
    analysis: &LineupAnalysis,
    opponent: &MatchupSide,
) -> bool {
    let mine = side.total_points;
    let theirs = opponent.total_points;
    (mine < theirs && mine + analysis.missed_points > theirs)
        || (mine > theirs && mine - analysis.missed_points < theirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, points: f64, bench: bool) -> PlayerSlot {
        PlayerSlot {
            player_id: id.to_string(),
            name: id.to_uppercase(),
            team: None,
            position: None,
            roster_slot: if bench { "BN" } else { "FLEX" }.to_string(),
            points,
        }
    }

    fn side(total: f64, starters: &[(&str, f64)], bench: &[(&str, f64)]) -> MatchupSide {
        MatchupSide {
            roster_id: 1,
            matchup_id: Some(1),
            owner: "Alice".into(),
            co_owners: Vec::new(),
            label: "Alice".into(),
            total_points: total,
            starters: starters.iter().map(|(id, p)| player(id, *p, false)).collect(),
            bench: bench.iter().map(|(id, p)| player(id, *p, true)).collect(),
        }
    }

    #[test]
    fn bench_above_worst_starter_is_missed() {
        let s = side(40.0, &[("a", 20.0), ("b", 5.0), ("c", 15.0)], &[("x", 12.0), ("y", 3.0), ("z", 7.0)]);
        let analysis = analyze(&s);

        assert_eq!(analysis.worst_starter.as_ref().unwrap().player_id, "b");
        let ids: Vec<&str> = analysis
            .outperforming_bench
            .iter()
            .map(|p| p.player_id.as_str())
            .collect();
        assert_eq!(ids, vec!["x", "z"]);
        assert_eq!(analysis.missed_points, 9.0);
        assert!(!analysis.optimal_choices);

        let starter_points: Vec<f64> = analysis.starters.iter().map(|p| p.points).collect();
        assert_eq!(starter_points, vec![5.0, 15.0, 20.0]);
        let bench_points: Vec<f64> = analysis.bench.iter().map(|p| p.points).collect();
        assert_eq!(bench_points, vec![12.0, 7.0, 3.0]);
    }

    #[test]
    fn equal_points_are_not_missed() {
        let analysis = analyze(&side(10.0, &[("a", 10.0)], &[("x", 10.0)]));
        assert!(analysis.optimal_choices);
        assert_eq!(analysis.missed_points, 0.0);
    }

    #[test]
    fn no_starters_is_optimal() {
        let analysis = analyze(&side(0.0, &[], &[("x", 30.0)]));
        assert!(analysis.worst_starter.is_none());
        assert!(analysis.optimal_choices);
        assert_eq!(analysis.missed_points, 0.0);
    }

    #[test]
    fn bench_above_every_starter_is_never_optimal() {
        for top in [25.0, 50.0, 100.0] {
            let analysis = analyze(&side(30.0, &[("a", 10.0), ("b", 20.0)], &[("x", top)]));
            assert!(!analysis.optimal_choices);
            assert!(analysis.missed_points > 0.0);
        }
    }

    #[test]
    fn loss_within_missed_points_could_flip() {
        let me = side(90.0, &[("a", 5.0)], &[("x", 20.0)]);
        let analysis = analyze(&me);
        assert!(could_have_changed_outcome(&me, &analysis, &side(100.0, &[], &[])));
        assert!(!could_have_changed_outcome(&me, &analysis, &side(110.0, &[], &[])));
        // Reaching a tie is not a flip.
        assert!(!could_have_changed_outcome(&me, &analysis, &side(105.0, &[], &[])));
    }

    #[test]
    fn win_is_checked_against_subtracted_missed_points() {
        let me = side(100.0, &[("a", 5.0)], &[("x", 20.0)]);
        let analysis = analyze(&me);
        assert!(could_have_changed_outcome(&me, &analysis, &side(90.0, &[], &[])));
        assert!(!could_have_changed_outcome(&me, &analysis, &side(80.0, &[], &[])));
    }

    #[test]
    fn tie_never_flips() {
        let me = side(100.0, &[("a", 5.0)], &[("x", 50.0)]);
        let analysis = analyze(&me);
        assert!(!could_have_changed_outcome(&me, &analysis, &side(100.0, &[], &[])));
    }
}
