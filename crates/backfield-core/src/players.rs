// Static player directory: id -> name/team/position.
//
// The upstream directory is large and changes at most daily, so it is loaded
// at most once per process and mirrored to SQLite between runs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::db::PlayerStore;
use crate::sleeper::types::PlayerRecord;
use crate::sleeper::SleeperApi;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    pub team: Option<String>,
    pub position: Option<String>,
}

impl PlayerInfo {
    /// Stand-in for an id the directory does not know.
    pub fn unknown(player_id: &str) -> Self {
        Self {
            name: format!("Unknown Player ({player_id})"),
            team: None,
            position: None,
        }
    }

    fn from_record(player_id: &str, record: &PlayerRecord) -> Self {
        Self {
            name: record.name().unwrap_or_else(|| player_id.to_string()),
            team: record.team.clone(),
            position: record.position.clone(),
        }
    }
}

pub type PlayerMap = HashMap<String, PlayerInfo>;

/// `player_id`'s entry in `players`, or the unknown-player placeholder.
pub fn describe(players: &PlayerMap, player_id: &str) -> PlayerInfo {
    players
        .get(player_id)
        .cloned()
        .unwrap_or_else(|| PlayerInfo::unknown(player_id))
}

pub struct PlayerDirectory {
    store: Option<PlayerStore>,
    max_age: Duration,
    loaded: OnceCell<Arc<PlayerMap>>,
}

impl PlayerDirectory {
    pub fn new(store: Option<PlayerStore>, max_age_hours: u32) -> Self {
        Self {
            store,
            max_age: Duration::hours(i64::from(max_age_hours)),
            loaded: OnceCell::new(),
        }
    }

    /// A directory with no on-disk mirror.
    pub fn in_memory() -> Self {
        Self::new(None, 24)
    }

    /// The directory, loading it on first use.
    ///
    /// Never fails: if the upstream is unreachable a stale on-disk copy is
    /// served, and failing that an empty map. Neither fallback is memoized,
    /// so the next call tries again.
    pub async fn get(&self, api: &dyn SleeperApi) -> Arc<PlayerMap> {
        match self.loaded.get_or_try_init(|| self.load(api)).await {
            Ok(players) => players.clone(),
            Err(fallback) => fallback,
        }
    }

    async fn load(&self, api: &dyn SleeperApi) -> Result<Arc<PlayerMap>, Arc<PlayerMap>> {
        if let Some(players) = self.fresh_from_store() {
            info!(count = players.len(), "player directory loaded from cache");
            return Ok(Arc::new(players));
        }

        match api.players().await {
            Ok(records) => {
                let players: PlayerMap = records
                    .iter()
                    .map(|(id, record)| (id.clone(), PlayerInfo::from_record(id, record)))
                    .collect();
                info!(count = players.len(), "player directory fetched from upstream");
                if let Some(store) = &self.store {
                    if let Err(e) = store.replace_all(&players, Utc::now()) {
                        warn!("failed to cache player directory: {e:#}");
                    }
                }
                Ok(Arc::new(players))
            }
            Err(e) => {
                warn!("failed to fetch player directory: {e}");
                let stale = self
                    .store
                    .as_ref()
                    .and_then(|store| store.load_all().ok())
                    .unwrap_or_default();
                if !stale.is_empty() {
                    warn!(count = stale.len(), "serving stale player directory");
                }
                Err(Arc::new(stale))
            }
        }
    }

    fn fresh_from_store(&self) -> Option<PlayerMap> {
        let store = self.store.as_ref()?;
        let fetched_at = match store.fetched_at() {
            Ok(Some(at)) => at,
            Ok(None) => return None,
            Err(e) => {
                warn!("failed to read player cache timestamp: {e:#}");
                return None;
            }
        };
        if Utc::now() - fetched_at >= self.max_age {
            return None;
        }
        match store.load_all() {
            Ok(players) if !players.is_empty() => Some(players),
            Ok(_) => None,
            Err(e) => {
                warn!("failed to read player cache: {e:#}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sleeper::fake::FakeSleeper;

    #[tokio::test]
    async fn fetches_once_per_process() {
        let api = FakeSleeper::new();
        api.add_player("4046", "Patrick Mahomes", Some("KC"), "QB");
        let directory = PlayerDirectory::in_memory();

        let first = directory.get(&api).await;
        let second = directory.get(&api).await;

        assert_eq!(first["4046"].name, "Patrick Mahomes");
        assert_eq!(second.len(), 1);
        assert_eq!(api.calls("players"), 1);
    }

    #[tokio::test]
    async fn fresh_store_skips_upstream() {
        let store = PlayerStore::open(":memory:").unwrap();
        let mut cached = PlayerMap::new();
        cached.insert(
            "96".to_string(),
            PlayerInfo {
                name: "Aaron Rodgers".into(),
                team: Some("NYJ".into()),
                position: Some("QB".into()),
            },
        );
        store.replace_all(&cached, Utc::now()).unwrap();

        let api = FakeSleeper::new();
        let directory = PlayerDirectory::new(Some(store), 24);

        assert_eq!(describe(&*directory.get(&api).await, "96").name, "Aaron Rodgers");
        assert_eq!(api.calls("players"), 0);
    }

    #[tokio::test]
    async fn stale_store_is_refreshed_and_rewritten() {
        let store = PlayerStore::open(":memory:").unwrap();
        let mut cached = PlayerMap::new();
        cached.insert("96".to_string(), PlayerInfo::unknown("96"));
        store
            .replace_all(&cached, Utc::now() - Duration::hours(48))
            .unwrap();

        let api = FakeSleeper::new();
        api.add_player("96", "Aaron Rodgers", Some("NYJ"), "QB");
        let directory = PlayerDirectory::new(Some(store), 24);

        assert_eq!(describe(&*directory.get(&api).await, "96").name, "Aaron Rodgers");
        assert_eq!(api.calls("players"), 1);
    }

    #[tokio::test]
    async fn upstream_failure_serves_stale_copy_without_memoizing() {
        let store = PlayerStore::open(":memory:").unwrap();
        let mut cached = PlayerMap::new();
        cached.insert(
            "96".to_string(),
            PlayerInfo {
                name: "Aaron Rodgers".into(),
                team: Some("GB".into()),
                position: Some("QB".into()),
            },
        );
        store
            .replace_all(&cached, Utc::now() - Duration::hours(48))
            .unwrap();

        let api = FakeSleeper::new();
        api.fail("players", "");
        let directory = PlayerDirectory::new(Some(store), 24);

        assert_eq!(describe(&*directory.get(&api).await, "96").team.as_deref(), Some("GB"));
        directory.get(&api).await;
        assert_eq!(api.calls("players"), 2);
    }

    #[tokio::test]
    async fn unknown_ids_get_fallback_label() {
        let api = FakeSleeper::new();
        let directory = PlayerDirectory::in_memory();
        let info = describe(&*directory.get(&api).await, "9999");
        assert_eq!(info.name, "Unknown Player (9999)");
        assert_eq!(info.team, None);
    }
}
