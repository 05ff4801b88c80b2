use async_trait::async_trait;

use super::RosterApi;
use crate::domain::errors::RosterResult;
use crate::domain::roster::{EntryId, NewRosterEntry, RosterEntry, RosterStore};

/// In-process transport: the guard talks straight to a store
#[async_trait]
impl RosterApi for RosterStore {
    async fn list(&self) -> RosterResult<Vec<RosterEntry>> {
        RosterStore::list(self).await
    }

    async fn add(&self, candidate: &NewRosterEntry) -> RosterResult<RosterEntry> {
        RosterStore::add(self, candidate.clone()).await
    }

    async fn remove(&self, entry_id: EntryId) -> RosterResult<()> {
        RosterStore::remove(self, entry_id).await.map(|_| ())
    }
}
