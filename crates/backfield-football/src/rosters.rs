// Rosters with their owners' display names attached.

use std::collections::{BTreeSet, HashMap};

use backfield_core::sleeper::types::Roster;
use backfield_core::{SleeperApi, SleeperError};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::warn;

/// Stand-in when an owner cannot be resolved.
pub const UNKNOWN_OWNER: &str = "Unknown Owner";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRoster {
    pub roster: Roster,
    pub owner_name: String,
    pub co_owner_names: Vec<String>,
}

impl ResolvedRoster {
    pub fn roster_id(&self) -> u32 {
        self.roster.roster_id
    }

    /// `"Alice"`, or `"Alice & Bob"` for a co-owned team.
    pub fn display_label(&self) -> String {
        std::iter::once(self.owner_name.as_str())
            .chain(self.co_owner_names.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" & ")
    }
}

/// Fetch a league's rosters and resolve every distinct owner and co-owner,
/// each exactly once and concurrently.
///
/// Only the roster fetch can fail; a user lookup that fails is logged and
/// the owner shows as [`UNKNOWN_OWNER`].
pub async fn fetch_resolved_rosters(
    api: &dyn SleeperApi,
    league_id: &str,
) -> Result<Vec<ResolvedRoster>, SleeperError> {
    let rosters = api.rosters(league_id).await?;
    Ok(resolve_owners(api, rosters).await)
}

pub async fn resolve_owners(api: &dyn SleeperApi, rosters: Vec<Roster>) -> Vec<ResolvedRoster> {
    let owner_ids: BTreeSet<&str> = rosters
        .iter()
        .flat_map(|r| {
            r.owner_id
                .as_deref()
                .into_iter()
                .chain(r.co_owners().iter().map(String::as_str))
        })
        .collect();

    let lookups = owner_ids.iter().map(|id| async move {
        let name = match api.user(id).await {
            Ok(user) => user.label().map(str::to_string),
            Err(e) => {
                warn!(user_id = %id, "owner lookup failed: {e}");
                None
            }
        };
        (id.to_string(), name.unwrap_or_else(|| UNKNOWN_OWNER.to_string()))
    });
    let names: HashMap<String, String> = join_all(lookups).await.into_iter().collect();

    let name_of = |id: &str| {
        names
            .get(id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_OWNER.to_string())
    };

    rosters
        .into_iter()
        .map(|roster| ResolvedRoster {
            owner_name: roster
                .owner_id
                .as_deref()
                .map(name_of)
                .unwrap_or_else(|| UNKNOWN_OWNER.to_string()),
            co_owner_names: roster.co_owners().iter().map(|id| name_of(id)).collect(),
            roster,
        })
        .collect()
}

/// The roster `user_id` owns or co-owns.
pub fn find_user_roster<'a>(rosters: &'a [ResolvedRoster], user_id: &str) -> Option<&'a ResolvedRoster> {
    rosters.iter().find(|r| r.roster.is_owned_by(user_id))
}

pub fn find_roster(rosters: &[ResolvedRoster], roster_id: u32) -> Option<&ResolvedRoster> {
    rosters.iter().find(|r| r.roster_id() == roster_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backfield_core::sleeper::fake::{roster, FakeSleeper};

    #[tokio::test]
    async fn owners_resolve_once_each() {
        let api = FakeSleeper::new();
        api.add_user("u1", "alice", "Alice");
        api.add_user("u2", "bob", "Bob");
        let mut shared = roster(2, "u2", &[]);
        shared.co_owners = Some(vec!["u1".into()]);
        api.set_rosters("L", vec![roster(1, "u1", &["p1"]), shared]);

        let rosters = fetch_resolved_rosters(&api, "L").await.unwrap();

        assert_eq!(rosters[0].owner_name, "Alice");
        assert_eq!(rosters[1].display_label(), "Bob & Alice");
        assert_eq!(api.calls("user"), 2);
    }

    #[tokio::test]
    async fn failed_or_missing_owner_is_sentinel() {
        let api = FakeSleeper::new();
        api.add_user("u1", "alice", "Alice");
        api.fail("user", "u1");
        let mut orphan = roster(2, "x", &[]);
        orphan.owner_id = None;
        api.set_rosters("L", vec![roster(1, "u1", &[]), orphan, roster(3, "ghost", &[])]);

        let rosters = fetch_resolved_rosters(&api, "L").await.unwrap();

        let names: Vec<&str> = rosters.iter().map(|r| r.owner_name.as_str()).collect();
        assert_eq!(names, vec![UNKNOWN_OWNER; 3]);
    }

    #[tokio::test]
    async fn roster_fetch_failure_propagates() {
        let api = FakeSleeper::new();
        assert!(fetch_resolved_rosters(&api, "missing")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn co_owner_finds_their_roster() {
        let api = FakeSleeper::new();
        let mut shared = roster(7, "u2", &[]);
        shared.co_owners = Some(vec!["u1".into()]);
        let rosters = resolve_owners(&api, vec![roster(1, "u3", &[]), shared]).await;

        assert_eq!(find_user_roster(&rosters, "u1").map(|r| r.roster_id()), Some(7));
        assert!(find_user_roster(&rosters, "nobody").is_none());
        assert_eq!(find_roster(&rosters, 1).map(|r| r.roster_id()), Some(1));
    }
}
