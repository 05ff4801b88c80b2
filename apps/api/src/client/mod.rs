// Client side of the roster: the guard that pre-checks additions and the
// transports it can talk through.

pub mod guard;
pub mod http;
pub mod local;

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::RosterResult;
use crate::domain::roster::{EntryId, NewRosterEntry, RosterEntry};

pub use guard::{Removal, RosterGuard};
pub use http::HttpRosterApi;

/// Operations a client can perform against the Roster Service
#[async_trait]
pub trait RosterApi: Send + Sync {
    /// Fetch the current team
    async fn list(&self) -> RosterResult<Vec<RosterEntry>>;

    /// Ask the service to add an entry
    async fn add(&self, candidate: &NewRosterEntry) -> RosterResult<RosterEntry>;

    /// Ask the service to remove an entry
    async fn remove(&self, entry_id: EntryId) -> RosterResult<()>;
}

#[async_trait]
impl<T> RosterApi for Arc<T>
where
    T: RosterApi + ?Sized,
{
    async fn list(&self) -> RosterResult<Vec<RosterEntry>> {
        (**self).list().await
    }

    async fn add(&self, candidate: &NewRosterEntry) -> RosterResult<RosterEntry> {
        (**self).add(candidate).await
    }

    async fn remove(&self, entry_id: EntryId) -> RosterResult<()> {
        (**self).remove(entry_id).await
    }
}
