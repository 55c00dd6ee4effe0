// Sleeper REST client.
//
// All requests are unauthenticated GETs against the read-only v1 API. The
// `SleeperApi` trait is the seam the analytics code is written against so it
// can be driven by the in-memory fake in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::types::{
    BracketEdge, League, MatchupEntry, NflState, PlayerRecord, Roster, TrendKind, TrendingPlayer,
    User,
};
use crate::config::SleeperConfig;
use crate::error::SleeperError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.sleeper.app/v1";

/// Read-only view of the Sleeper API.
#[async_trait]
pub trait SleeperApi: Send + Sync {
    /// Look up a user by username or user id.
    async fn user(&self, username_or_id: &str) -> Result<User, SleeperError>;

    async fn user_leagues(&self, user_id: &str, season: &str) -> Result<Vec<League>, SleeperError>;

    async fn league(&self, league_id: &str) -> Result<League, SleeperError>;

    async fn rosters(&self, league_id: &str) -> Result<Vec<Roster>, SleeperError>;

    async fn matchups(&self, league_id: &str, week: u32) -> Result<Vec<MatchupEntry>, SleeperError>;

    async fn winners_bracket(&self, league_id: &str) -> Result<Vec<BracketEdge>, SleeperError>;

    async fn nfl_state(&self) -> Result<NflState, SleeperError>;

    async fn trending(
        &self,
        kind: TrendKind,
        lookback_hours: u32,
        limit: u32,
    ) -> Result<Vec<TrendingPlayer>, SleeperError>;

    /// The full static player directory (several megabytes).
    async fn players(&self) -> Result<HashMap<String, PlayerRecord>, SleeperError>;
}

// ---------------------------------------------------------------------------
// HttpSleeperClient
// ---------------------------------------------------------------------------

pub struct HttpSleeperClient {
    http: reqwest::Client,
    base_url: Url,
    sport: String,
}

impl HttpSleeperClient {
    pub fn new(base_url: &str, sport: impl Into<String>) -> Result<Self, SleeperError> {
        let invalid = |reason: String| SleeperError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("cannot hold a path".to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: parsed,
            sport: sport.into(),
        })
    }

    pub fn from_config(config: &SleeperConfig) -> Result<Self, SleeperError> {
        Self::new(&config.api_base_url, config.sport.clone())
    }

    /// The base URL extended by `segments`, each percent-encoded as a single
    /// path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, SleeperError> {
        debug!(%url, "GET");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| SleeperError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SleeperError::not_found(what));
        }
        if !status.is_success() {
            return Err(SleeperError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| SleeperError::Transport {
                url: url.to_string(),
                source,
            })?;
        decode_body(&body, url.as_str(), what)
    }
}

/// Decode a response body. Sleeper answers unknown ids with `200 null`.
pub(crate) fn decode_body<T: DeserializeOwned>(
    body: &str,
    url: &str,
    what: &str,
) -> Result<T, SleeperError> {
    let value: Value = serde_json::from_str(body).map_err(|source| SleeperError::Decode {
        url: url.to_string(),
        source,
    })?;
    if value.is_null() {
        return Err(SleeperError::not_found(what));
    }
    serde_json::from_value(value).map_err(|source| SleeperError::Decode {
        url: url.to_string(),
        source,
    })
}

#[async_trait]
impl SleeperApi for HttpSleeperClient {
    async fn user(&self, username_or_id: &str) -> Result<User, SleeperError> {
        self.get_json(self.url(&["user", username_or_id]), &format!("user {username_or_id}"))
            .await
    }

    async fn user_leagues(&self, user_id: &str, season: &str) -> Result<Vec<League>, SleeperError> {
        let url = self.url(&["user", user_id, "leagues", self.sport.as_str(), season]);
        match self.get_json(url, "leagues").await {
            // A user with no leagues that season gets `null`.
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            other => other,
        }
    }

    async fn league(&self, league_id: &str) -> Result<League, SleeperError> {
        self.get_json(self.url(&["league", league_id]), &format!("league {league_id}"))
            .await
    }

    async fn rosters(&self, league_id: &str) -> Result<Vec<Roster>, SleeperError> {
        self.get_json(
            self.url(&["league", league_id, "rosters"]),
            &format!("rosters for league {league_id}"),
        )
        .await
    }

    async fn matchups(&self, league_id: &str, week: u32) -> Result<Vec<MatchupEntry>, SleeperError> {
        self.get_json(
            self.url(&["league", league_id, "matchups", week.to_string().as_str()]),
            &format!("week {week} matchups for league {league_id}"),
        )
        .await
    }

    async fn winners_bracket(&self, league_id: &str) -> Result<Vec<BracketEdge>, SleeperError> {
        self.get_json(
            self.url(&["league", league_id, "winners_bracket"]),
            &format!("winners bracket for league {league_id}"),
        )
        .await
    }

    async fn nfl_state(&self) -> Result<NflState, SleeperError> {
        self.get_json(self.url(&["state", self.sport.as_str()]), "sport state")
            .await
    }

    async fn trending(
        &self,
        kind: TrendKind,
        lookback_hours: u32,
        limit: u32,
    ) -> Result<Vec<TrendingPlayer>, SleeperError> {
        let mut url = self.url(&["players", self.sport.as_str(), "trending", kind.as_str()]);
        url.query_pairs_mut()
            .append_pair("lookback_hours", &lookback_hours.to_string())
            .append_pair("limit", &limit.to_string());
        self.get_json(url, "trending players").await
    }

    async fn players(&self) -> Result<HashMap<String, PlayerRecord>, SleeperError> {
        self.get_json(self.url(&["players", self.sport.as_str()]), "player directory")
            .await
    }
}
