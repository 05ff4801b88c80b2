use super::RosterApi;
use crate::domain::errors::{RosterError, RosterResult};
use crate::domain::roster::{validation, EntryId, NewRosterEntry, RosterEntry};

/// Outcome of a removal request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The entry was on the team and is gone now
    Removed,
    /// The entry was already gone, e.g. removed from another tab
    AlreadyGone,
}

/// Client-side pre-check for roster changes.
///
/// Before asking the service to add an entry, the guard fetches a fresh
/// snapshot and runs the same rules the service runs, so an obvious
/// rejection never costs a write request. The snapshot can be stale, so a
/// request that passes here may still be refused by the service; both kinds
/// of refusal come back as the same `RosterError`.
pub struct RosterGuard<A> {
    api: A,
}

impl<A: RosterApi> RosterGuard<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Re-fetch the team from the service
    pub async fn team(&self) -> RosterResult<Vec<RosterEntry>> {
        self.api.list().await
    }

    /// Add a Pokémon to the team, rejecting locally when the snapshot
    /// already shows the request cannot succeed
    pub async fn add_to_team(&self, candidate: NewRosterEntry) -> RosterResult<RosterEntry> {
        let snapshot = self.api.list().await?;

        if let Err(err) = validation::check_candidate(&snapshot, &candidate) {
            tracing::warn!(
                pokemon_id = candidate.pokemon_id,
                team_size = snapshot.len(),
                "Rejected before contacting the roster service: {}",
                err
            );
            return Err(err);
        }

        self.api.add(&candidate).await.map_err(|err| {
            tracing::warn!(
                pokemon_id = candidate.pokemon_id,
                "Roster service refused the entry: {}",
                err
            );
            err
        })
    }

    /// Remove an entry; an entry that is already gone counts as removed
    pub async fn remove_from_team(&self, entry_id: EntryId) -> RosterResult<Removal> {
        match self.api.remove(entry_id.clone()).await {
            Ok(()) => Ok(Removal::Removed),
            Err(RosterError::NotFound(_)) => {
                tracing::warn!(%entry_id, "Team entry was already removed");
                Ok(Removal::AlreadyGone)
            }
            Err(err) => Err(err),
        }
    }
}
