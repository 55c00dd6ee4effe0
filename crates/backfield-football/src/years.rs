// Year expressions: "2022", "2022-2024", "2022,2024", or nothing for "all".

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum YearRangeError {
    #[error("invalid year {token:?} in range {expression:?}")]
    InvalidBound { expression: String, token: String },
    #[error("range {expression:?} ends before it starts")]
    Reversed { expression: String },
    #[error("range {expression:?} spans more than {} seasons", MAX_RANGE_SEASONS)]
    TooWide { expression: String },
}

/// Widest range a single expression may expand to.
pub const MAX_RANGE_SEASONS: u32 = 100;

/// Seasons a query asked for and the subset that can actually be answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct YearSelection {
    /// Every season the expression names, in expression order.
    pub requested: Vec<String>,
    /// `requested` restricted to known seasons.
    pub to_process: Vec<String>,
}

impl YearSelection {
    /// Requested seasons that will produce no data.
    pub fn missing(&self) -> Vec<String> {
        self.requested
            .iter()
            .filter(|s| !self.to_process.contains(s))
            .cloned()
            .collect()
    }
}

/// Parse `expression` against the seasons we have history for.
///
/// With no expression, every available season is processed, newest first.
/// Ranges expand to every integer season in `[start, end]`, oldest first;
/// lists keep their given order, and a season listed twice is processed
/// once. Seasons outside `available` stay in
/// `requested` so they can be reported as having no data.
pub fn parse_years(
    expression: Option<&str>,
    available: &BTreeSet<String>,
) -> Result<YearSelection, YearRangeError> {
    let expression = expression.map(str::trim).filter(|e| !e.is_empty());

    let Some(expression) = expression else {
        let mut seasons: Vec<String> = available.iter().cloned().collect();
        seasons.sort_by_key(|s| std::cmp::Reverse(season_number(s)));
        return Ok(YearSelection {
            requested: seasons.clone(),
            to_process: seasons,
        });
    };

    let requested: Vec<String> = if let Some((start, end)) = expression.split_once('-') {
        let start = parse_bound(expression, start)?;
        let end = parse_bound(expression, end)?;
        if start > end {
            return Err(YearRangeError::Reversed {
                expression: expression.to_string(),
            });
        }
        if end - start >= MAX_RANGE_SEASONS {
            return Err(YearRangeError::TooWide {
                expression: expression.to_string(),
            });
        }
        (start..=end).map(|y| y.to_string()).collect()
    } else {
        let mut seen = BTreeSet::new();
        expression
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.to_string()))
            .map(str::to_string)
            .collect()
    };

    let to_process = requested
        .iter()
        .filter(|s| available.contains(*s))
        .cloned()
        .collect();

    Ok(YearSelection {
        requested,
        to_process,
    })
}

fn parse_bound(expression: &str, token: &str) -> Result<u32, YearRangeError> {
    token
        .trim()
        .parse::<u32>()
        .map_err(|_| YearRangeError::InvalidBound {
            expression: expression.to_string(),
            token: token.trim().to_string(),
        })
}

/// Numeric value of a season label; non-numeric labels sort last.
fn season_number(season: &str) -> Option<u32> {
    season.parse().ok()
}
