// Infrastructure layer module
// Contains persistence adapters and external service integrations
// Follows Hexagonal Architecture

pub mod pokeapi;
pub mod repositories;

use std::sync::Arc;

use crate::config::StorageBackend;
use crate::domain::errors::RosterResult;
use crate::domain::repositories::RosterRepository;

pub use pokeapi::PokeApiClient;

/// Builds the persistence backend selected by configuration
pub async fn connect_repository(
    backend: &StorageBackend,
) -> RosterResult<Arc<dyn RosterRepository>> {
    let repository: Arc<dyn RosterRepository> = match backend {
        StorageBackend::JsonFile(path) => {
            tracing::info!(path = %path.display(), "Using JSON document storage");
            Arc::new(repositories::JsonFileRosterRepository::new(path.clone()))
        }
        StorageBackend::Sqlite(url) => {
            tracing::info!(%url, "Using SQLite storage");
            Arc::new(repositories::SqliteRosterRepository::connect(url).await?)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, the team will not survive a restart");
            Arc::new(repositories::InMemoryRosterRepository::new())
        }
    };

    Ok(repository)
}
