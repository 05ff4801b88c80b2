// Application configuration, loaded from the environment (and `.env`).

use std::path::PathBuf;

use crate::infrastructure::pokeapi::DEFAULT_POKEAPI_BASE_URL;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DB_PATH: &str = "db.json";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:roster.db?mode=rwc";

/// Where the roster document is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Single JSON document on disk
    JsonFile(PathBuf),
    /// SQLite database at the given connection URL
    Sqlite(String),
    /// Process memory only
    Memory,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Persistence backend for the roster.
    pub storage: StorageBackend,
    /// Base URL of the Pokémon data API.
    pub pokeapi_base_url: String,
}

impl Config {
    /// Load configuration from `.env` and environment variables.
    ///
    /// Environment variables:
    /// - `PORT` - HTTP server port (default: 3001)
    /// - `ROSTER_BACKEND` - `json`, `sqlite` or `memory` (default: `json`)
    /// - `ROSTER_DB_PATH` - JSON document path (default: `db.json`)
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:roster.db?mode=rwc`)
    /// - `POKEAPI_BASE_URL` - Pokémon data API (default: `https://pokeapi.co/api/v2`)
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("PORT={raw:?} is not a valid port, using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let json_file = || {
            StorageBackend::JsonFile(
                lookup("ROSTER_DB_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            )
        };

        let backend = lookup("ROSTER_BACKEND").map(|v| v.trim().to_ascii_lowercase());
        let storage = match backend.as_deref() {
            None | Some("json") | Some("file") => json_file(),
            Some("sqlite") => StorageBackend::Sqlite(
                lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            ),
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                tracing::warn!("ROSTER_BACKEND={other:?} is not recognised, using JSON storage");
                json_file()
            }
        };

        let pokeapi_base_url =
            lookup("POKEAPI_BASE_URL").unwrap_or_else(|| DEFAULT_POKEAPI_BASE_URL.to_string());

        Config {
            port,
            storage,
            pokeapi_base_url,
        }
    }
}
