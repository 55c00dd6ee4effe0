// League-wide trending adds and drops, with player names attached.

use backfield_core::players::{describe, PlayerDirectory};
use backfield_core::sleeper::types::TrendKind;
use backfield_core::{SleeperApi, SleeperError};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingEntry {
    pub player_id: String,
    pub name: String,
    pub team: Option<String>,
    pub position: Option<String>,
    pub count: u32,
}

pub async fn trending(
    api: &dyn SleeperApi,
    players: &PlayerDirectory,
    kind: TrendKind,
    lookback_hours: u32,
    limit: u32,
) -> Result<Vec<TrendingEntry>, SleeperError> {
    let (trend, directory) = tokio::join!(api.trending(kind, lookback_hours, limit), players.get(api));
    Ok(trend?
        .into_iter()
        .map(|t| {
            let info = describe(&directory, &t.player_id);
            TrendingEntry {
                name: info.name,
                team: info.team,
                position: info.position,
                count: t.count,
                player_id: t.player_id,
            }
        })
        .collect())
}
