use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use pokemon_team_api::api::{self, AppState};
use pokemon_team_api::config::Config;
use pokemon_team_api::domain::roster::validation;
use pokemon_team_api::infrastructure::PokeApiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    pokemon_team_api::init_tracing();

    // Load configuration
    let config = Config::load();

    // Open roster storage
    tracing::info!("Opening roster storage...");
    let roster = pokemon_team_api::open_store(&config)
        .await
        .context("Failed to open roster storage")?;

    let team = roster.list().await.context("Failed to read roster")?;
    if !validation::is_consistent(&team) {
        tracing::warn!(
            team_size = team.len(),
            "Stored team has duplicates or too many entries, run clean-team or call /clean-team"
        );
    }

    let pokemon = Arc::new(PokeApiClient::new(config.pokeapi_base_url.clone()));
    let app = api::router(AppState::new(roster, pokemon));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Roster service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
