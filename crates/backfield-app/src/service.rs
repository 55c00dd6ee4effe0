// Capability layer: every question the CLI can ask, answered per season.
//
// Each capability resolves the user and league, walks the league's history,
// narrows it to the requested seasons, and runs one per-season analysis over
// them in order.

use std::sync::Arc;

use backfield_core::players::PlayerDirectory;
use backfield_core::sleeper::types::{League, TrendKind};
use backfield_core::{SleeperApi, SleeperError};
use backfield_football::bracket::{fetch_bracket, BracketReport, PlayoffStatus};
use backfield_football::head_to_head::{season_head_to_head, HeadToHeadRecord};
use backfield_football::lineup::{analyze, could_have_changed_outcome, LineupAnalysis};
use backfield_football::matchup::{MatchupDetails, MatchupError, MatchupResolver};
use backfield_football::rosters::fetch_resolved_rosters;
use backfield_football::settings::SeasonSettings;
use backfield_football::standings::{standings, StandingsRow};
use backfield_football::trending::{trending, TrendingEntry};
use backfield_football::{
    dispatch_seasons, parse_years, resolve_chain, IdentityCache, IdentityResolver,
    MultiYearReport, SeasonEntry, SeasonHistory, SeasonResult, YearRangeError, YearSelection,
};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AnalystError {
    #[error("no Sleeper user named {username:?}")]
    UnknownUser { username: String },
    #[error("{username} has no league named {league:?} this season or last")]
    UnknownLeague { username: String, league: String },
    #[error(transparent)]
    Years(#[from] YearRangeError),
    #[error("Sleeper request failed: {0}")]
    Upstream(#[from] SleeperError),
}

/// The resolved starting point of every league query.
#[derive(Debug, Clone)]
pub struct LeagueContext {
    pub user_id: String,
    pub league: League,
    pub history: SeasonHistory,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeagueHistory {
    pub league_name: String,
    pub seasons: SeasonHistory,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineupReview {
    pub matchup: MatchupDetails,
    pub analysis: LineupAnalysis,
    pub could_have_changed_outcome: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeadToHeadReport {
    pub opponent: String,
    pub seasons: MultiYearReport<HeadToHeadRecord>,
    pub overall: HeadToHeadRecord,
}

pub struct LeagueAnalyst {
    api: Arc<dyn SleeperApi>,
    identity: IdentityResolver,
    players: PlayerDirectory,
}

impl LeagueAnalyst {
    pub fn new(api: Arc<dyn SleeperApi>, cache: Arc<IdentityCache>, players: PlayerDirectory) -> Self {
        Self {
            identity: IdentityResolver::new(api.clone(), cache),
            api,
            players,
        }
    }

    fn api(&self) -> &dyn SleeperApi {
        self.api.as_ref()
    }

    async fn user_id(&self, username: &str) -> Result<String, AnalystError> {
        self.identity.user_id(username).await.map_err(|e| match e {
            e if e.is_not_found() => AnalystError::UnknownUser {
                username: username.to_string(),
            },
            e => e.into(),
        })
    }

    /// Resolve `username`'s league called `league_name` and walk its history.
    pub async fn league_context(
        &self,
        username: &str,
        league_name: &str,
    ) -> Result<LeagueContext, AnalystError> {
        let user_id = self.user_id(username).await?;
        let league_id = self
            .identity
            .league_id(&user_id, league_name)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => AnalystError::UnknownLeague {
                    username: username.to_string(),
                    league: league_name.to_string(),
                },
                e => e.into(),
            })?;
        let league = self.api.league(&league_id).await?;
        let history = resolve_chain(self.api(), league.clone()).await;
        info!(
            %league_id,
            seasons = history.len(),
            "resolved league history"
        );
        Ok(LeagueContext {
            user_id,
            league,
            history,
        })
    }

    async fn selection(
        &self,
        username: &str,
        league_name: &str,
        years: Option<&str>,
    ) -> Result<(LeagueContext, YearSelection), AnalystError> {
        let ctx = self.league_context(username, league_name).await?;
        let selection = parse_years(years, &ctx.history.seasons())?;
        Ok((ctx, selection))
    }

    pub async fn history(&self, username: &str, league_name: &str) -> Result<LeagueHistory, AnalystError> {
        let ctx = self.league_context(username, league_name).await?;
        Ok(LeagueHistory {
            league_name: ctx.league.name,
            seasons: ctx.history,
        })
    }

    pub async fn matchups(
        &self,
        username: &str,
        league_name: &str,
        years: Option<&str>,
        week: u32,
    ) -> Result<MultiYearReport<MatchupDetails>, AnalystError> {
        let (ctx, selection) = self.selection(username, league_name, years).await?;
        let user_id = ctx.user_id.as_str();
        let results = dispatch_seasons(&selection.to_process, &ctx.history, move |entry| async move {
            self.season_matchup(&entry, week, user_id).await
        })
        .await;
        Ok(MultiYearReport::new(&selection, results))
    }

    async fn season_matchup(
        &self,
        entry: &SeasonEntry,
        week: u32,
        user_id: &str,
    ) -> SeasonResult<MatchupDetails> {
        let season = entry.season.as_str();
        if !entry.status.has_games() {
            return SeasonResult::no_data(season, "season has not started");
        }
        let resolver = MatchupResolver::new(self.api(), &self.players);
        match resolver.resolve(&entry.league_id, week, user_id, season).await {
            Ok(details) => SeasonResult::ready(season, details),
            Err(MatchupError::Upstream(e)) => SeasonResult::unavailable(season, e),
            Err(e) => SeasonResult::no_data(season, e.to_string()),
        }
    }

    pub async fn lineup_review(
        &self,
        username: &str,
        league_name: &str,
        years: Option<&str>,
        week: u32,
    ) -> Result<MultiYearReport<LineupReview>, AnalystError> {
        let (ctx, selection) = self.selection(username, league_name, years).await?;
        let user_id = ctx.user_id.as_str();
        let results = dispatch_seasons(&selection.to_process, &ctx.history, move |entry| async move {
            match self.season_matchup(&entry, week, user_id).await {
                SeasonResult::Ready { season, data } => {
                    let analysis = analyze(&data.user);
                    let flipped = could_have_changed_outcome(&data.user, &analysis, &data.opponent);
                    SeasonResult::Ready {
                        season,
                        data: LineupReview {
                            matchup: data,
                            analysis,
                            could_have_changed_outcome: flipped,
                        },
                    }
                }
                SeasonResult::NoData { season, reason } => SeasonResult::NoData { season, reason },
                SeasonResult::Unavailable { season, error } => {
                    SeasonResult::Unavailable { season, error }
                }
            }
        })
        .await;
        Ok(MultiYearReport::new(&selection, results))
    }

    pub async fn playoff_brackets(
        &self,
        username: &str,
        league_name: &str,
        years: Option<&str>,
    ) -> Result<MultiYearReport<BracketReport>, AnalystError> {
        let (ctx, selection) = self.selection(username, league_name, years).await?;
        let results = dispatch_seasons(&selection.to_process, &ctx.history, move |entry| async move {
            match fetch_bracket(self.api(), &entry.league_id).await {
                Ok(report) if report.status == PlayoffStatus::NotStarted => {
                    SeasonResult::no_data(&entry.season, "playoffs have not started")
                }
                Ok(report) => SeasonResult::ready(&entry.season, report),
                Err(e) => SeasonResult::unavailable(&entry.season, e),
            }
        })
        .await;
        Ok(MultiYearReport::new(&selection, results))
    }

    pub async fn head_to_head(
        &self,
        username: &str,
        opponent: &str,
        league_name: &str,
        years: Option<&str>,
    ) -> Result<HeadToHeadReport, AnalystError> {
        let (ctx, selection) = self.selection(username, league_name, years).await?;
        let (opponent_id, now) = tokio::join!(self.user_id(opponent), self.api.nfl_state());
        let (opponent_id, now) = (opponent_id?, now?);

        let user_id = ctx.user_id.as_str();
        let (opponent_id, now) = (opponent_id.as_str(), &now);
        let results = dispatch_seasons(&selection.to_process, &ctx.history, move |entry| async move {
            season_head_to_head(self.api(), &entry, user_id, opponent_id, now).await
        })
        .await;

        let seasons = MultiYearReport::new(&selection, results);
        let overall = HeadToHeadRecord::combine(seasons.ready().map(|(_, record)| record));
        Ok(HeadToHeadReport {
            opponent: opponent.to_string(),
            seasons,
            overall,
        })
    }

    pub async fn standings(
        &self,
        username: &str,
        league_name: &str,
        years: Option<&str>,
    ) -> Result<MultiYearReport<Vec<StandingsRow>>, AnalystError> {
        let (ctx, selection) = self.selection(username, league_name, years).await?;
        let results = dispatch_seasons(&selection.to_process, &ctx.history, move |entry| async move {
            match fetch_resolved_rosters(self.api(), &entry.league_id).await {
                Ok(rosters) => match standings(entry.status, &rosters) {
                    Some(rows) => SeasonResult::ready(&entry.season, rows),
                    None => SeasonResult::no_data(&entry.season, "season has not started"),
                },
                Err(e) => SeasonResult::unavailable(&entry.season, e),
            }
        })
        .await;
        Ok(MultiYearReport::new(&selection, results))
    }

    pub async fn settings(
        &self,
        username: &str,
        league_name: &str,
        years: Option<&str>,
    ) -> Result<MultiYearReport<SeasonSettings>, AnalystError> {
        let (ctx, selection) = self.selection(username, league_name, years).await?;
        let results = dispatch_seasons(&selection.to_process, &ctx.history, move |entry| async move {
            match self.api.league(&entry.league_id).await {
                Ok(league) => SeasonResult::ready(&entry.season, SeasonSettings::from_league(&league)),
                Err(e) => SeasonResult::unavailable(
                    &entry.season,
                    format!("settings could not be loaded ({e})"),
                ),
            }
        })
        .await;
        Ok(MultiYearReport::new(&selection, results))
    }

    pub async fn trending(
        &self,
        kind: TrendKind,
        lookback_hours: u32,
        limit: u32,
    ) -> Result<Vec<TrendingEntry>, AnalystError> {
        Ok(trending(self.api(), &self.players, kind, lookback_hours, limit).await?)
    }
}
