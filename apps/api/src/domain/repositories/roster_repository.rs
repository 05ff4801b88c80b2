use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::battle::BattleRecord;
use crate::domain::errors::RosterResult;
use crate::domain::roster::RosterEntry;

/// The whole persisted state: the team plus the battle history.
///
/// Top-level fields this service does not know about are carried through
/// `extra` so a rewrite never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterDocument {
    #[serde(default)]
    pub team: Vec<RosterEntry>,
    #[serde(default)]
    pub battles: Vec<BattleRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A change applied to the document under the backend's write lock
///
/// Returns `Ok(true)` when the changed document must be saved. An error
/// aborts the update and leaves the stored document untouched.
pub type DocumentChange<'a> = dyn FnMut(&mut RosterDocument) -> RosterResult<bool> + Send + 'a;

/// Persistence backend for the roster document
///
/// Implementations only load and store; every rule about what may be
/// stored is enforced by `RosterStore`, which performs all of its writes
/// through [`RosterRepository::update`].
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Load the current document (empty when nothing was stored yet)
    async fn load(&self) -> RosterResult<RosterDocument>;

    /// Replace the stored document
    async fn save(&self, document: &RosterDocument) -> RosterResult<()>;

    /// Load, change and save as one step
    ///
    /// No other `update` against the same storage may interleave, whether it
    /// runs in this process or in another one (e.g. the `clean-team` binary
    /// next to a running server). `change` is called exactly once.
    async fn update(&self, change: &mut DocumentChange<'_>) -> RosterResult<()>;
}
