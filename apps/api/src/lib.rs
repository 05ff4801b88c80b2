//! Pokémon Team API Library
//!
//! This library provides the Roster Service: a persisted team of up to six
//! unique Pokémon, the maintenance pass that repairs it, a client-side guard
//! that mirrors the service's rules, and a small stat-based battle helper.

pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod infrastructure;

use std::sync::Arc;

use config::Config;
use domain::roster::RosterStore;

/// Installs the tracing subscriber used by the binaries
///
/// Honours `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Opens the configured backend and wraps it in a store
pub async fn open_store(config: &Config) -> domain::RosterResult<Arc<RosterStore>> {
    let repository = infrastructure::connect_repository(&config.storage).await?;
    Ok(Arc::new(RosterStore::new(repository)))
}
