use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::RosterResult;
use crate::domain::repositories::{DocumentChange, RosterDocument, RosterRepository};

/// In-process implementation of RosterRepository
///
/// Nothing survives a restart; used by tests and ephemeral runs.
#[derive(Default)]
pub struct InMemoryRosterRepository {
    document: RwLock<RosterDocument>,
}

impl InMemoryRosterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing document, which may violate the roster rules
    pub fn with_document(document: RosterDocument) -> Self {
        Self {
            document: RwLock::new(document),
        }
    }
}

#[async_trait]
impl RosterRepository for InMemoryRosterRepository {
    async fn load(&self) -> RosterResult<RosterDocument> {
        Ok(self.document.read().await.clone())
    }

    async fn save(&self, document: &RosterDocument) -> RosterResult<()> {
        *self.document.write().await = document.clone();
        Ok(())
    }

    async fn update(&self, change: &mut DocumentChange<'_>) -> RosterResult<()> {
        let mut document = self.document.write().await;
        let mut draft = document.clone();

        if change(&mut draft)? {
            *document = draft;
        }

        Ok(())
    }
}
