// Username / league-name resolution to Sleeper's opaque ids.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use backfield_core::{SleeperApi, SleeperError};
use tracing::debug;

/// Process-lifetime memo of identity lookups.
///
/// Append-only. Two lookups racing on the same key may both fetch and both
/// insert; the values are identical so the second write is harmless.
#[derive(Debug, Default)]
pub struct IdentityCache {
    user_ids: RwLock<HashMap<String, String>>,
    league_ids: RwLock<HashMap<(String, String), String>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn user_id(&self, username: &str) -> Option<String> {
        self.user_ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(username)
            .cloned()
    }

    fn put_user_id(&self, username: String, user_id: String) {
        self.user_ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(username, user_id);
    }

    fn league_id(&self, user_id: &str, league_name: &str) -> Option<String> {
        self.league_ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(user_id.to_string(), league_name.to_string()))
            .cloned()
    }

    fn put_league_id(&self, user_id: String, league_name: String, league_id: String) {
        self.league_ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((user_id, league_name), league_id);
    }
}

/// Resolves human-chosen names to ids, memoizing in an injected cache.
pub struct IdentityResolver {
    api: Arc<dyn SleeperApi>,
    cache: Arc<IdentityCache>,
}

impl IdentityResolver {
    pub fn new(api: Arc<dyn SleeperApi>, cache: Arc<IdentityCache>) -> Self {
        Self { api, cache }
    }

    /// Sleeper usernames are case-insensitive.
    pub async fn user_id(&self, username: &str) -> Result<String, SleeperError> {
        let key = normalize(username);
        if let Some(id) = self.cache.user_id(&key) {
            return Ok(id);
        }
        let user = self.api.user(&key).await?;
        debug!(username = %key, user_id = %user.user_id, "resolved user");
        self.cache.put_user_id(key, user.user_id.clone());
        Ok(user.user_id)
    }

    /// Find the league called `league_name` among the user's leagues for the
    /// current NFL season, then the previous one (before a league renews, only
    /// last season's league exists). Names match case-insensitively.
    pub async fn league_id(&self, user_id: &str, league_name: &str) -> Result<String, SleeperError> {
        let wanted = normalize(league_name);
        if let Some(id) = self.cache.league_id(user_id, &wanted) {
            return Ok(id);
        }

        let state = self.api.nfl_state().await?;
        let seasons = std::iter::once(state.season.clone()).chain(state.previous_season());

        for season in seasons {
            let leagues = self.api.user_leagues(user_id, &season).await?;
            if let Some(league) = leagues.iter().find(|l| normalize(&l.name) == wanted) {
                debug!(%season, league_id = %league.league_id, "resolved league");
                self.cache
                    .put_league_id(user_id.to_string(), wanted, league.league_id.clone());
                return Ok(league.league_id.clone());
            }
        }

        Err(SleeperError::not_found(format!(
            "league {league_name:?} for user {user_id}"
        )))
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
