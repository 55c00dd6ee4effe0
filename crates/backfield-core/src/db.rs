// SQLite persistence for the static player directory.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::players::PlayerInfo;

const FETCHED_AT_KEY: &str = "fetched_at";

/// SQLite-backed copy of the player directory plus the time it was fetched.
pub struct PlayerStore {
    conn: Mutex<Connection>,
}

impl PlayerStore {
    /// Open (or create) the store at `path`. Pass `":memory:"` for an
    /// ephemeral store.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open player store at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                player_id TEXT PRIMARY KEY,
                name      TEXT NOT NULL,
                team      TEXT,
                position  TEXT
            );

            CREATE TABLE IF NOT EXISTS directory_meta (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create player store schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("player store mutex poisoned")
    }

    /// Replace the whole directory and stamp it with `fetched_at`, in one
    /// transaction.
    pub fn replace_all(
        &self,
        players: &HashMap<String, PlayerInfo>,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM players", [])
            .context("failed to clear players")?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO players (player_id, name, team, position)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .context("failed to prepare player insert")?;
            for (player_id, info) in players {
                stmt.execute(params![player_id, info.name, info.team, info.position])
                    .with_context(|| format!("failed to insert player {player_id}"))?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO directory_meta (key, value) VALUES (?1, ?2)",
            params![FETCHED_AT_KEY, fetched_at.to_rfc3339()],
        )
        .context("failed to stamp player directory")?;
        tx.commit().context("failed to commit player directory")?;
        Ok(())
    }

    pub fn load_all(&self) -> Result<HashMap<String, PlayerInfo>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT player_id, name, team, position FROM players")
            .context("failed to prepare load_all query")?;

        let players = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    PlayerInfo {
                        name: row.get(1)?,
                        team: row.get(2)?,
                        position: row.get(3)?,
                    },
                ))
            })
            .context("failed to query players")?
            .collect::<std::result::Result<HashMap<_, _>, _>>()
            .context("failed to map player rows")?;

        Ok(players)
    }

    /// When the stored directory was fetched; `None` if never populated.
    pub fn fetched_at(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM directory_meta WHERE key = ?1",
                params![FETCHED_AT_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("failed to read fetched_at")?;

        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("invalid fetched_at timestamp {s:?}"))
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn info(name: &str, team: Option<&str>, position: &str) -> PlayerInfo {
        PlayerInfo {
            name: name.to_string(),
            team: team.map(str::to_string),
            position: Some(position.to_string()),
        }
    }

    #[test]
    fn empty_store_has_no_timestamp() {
        let store = PlayerStore::open(":memory:").unwrap();
        assert!(store.fetched_at().unwrap().is_none());
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn replace_all_overwrites_previous_directory() {
        let store = PlayerStore::open(":memory:").unwrap();
        let first_fetch = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();
        let second_fetch = Utc.with_ymd_and_hms(2024, 9, 2, 12, 0, 0).unwrap();

        let mut players = HashMap::new();
        players.insert("4046".to_string(), info("Patrick Mahomes", Some("KC"), "QB"));
        players.insert("1234".to_string(), info("Free Agent", None, "WR"));
        store.replace_all(&players, first_fetch).unwrap();

        let mut refreshed = HashMap::new();
        refreshed.insert("4046".to_string(), info("Patrick Mahomes", Some("KC"), "QB"));
        store.replace_all(&refreshed, second_fetch).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["4046"].team.as_deref(), Some("KC"));
        assert_eq!(store.fetched_at().unwrap(), Some(second_fetch));
    }

    #[test]
    fn null_team_round_trips_as_none() {
        let store = PlayerStore::open(":memory:").unwrap();
        let mut players = HashMap::new();
        players.insert("1234".to_string(), info("Free Agent", None, "WR"));
        store.replace_all(&players, Utc::now()).unwrap();

        assert_eq!(store.load_all().unwrap()["1234"].team, None);
    }
}
