//! One-shot maintenance: removes duplicate Pokémon from the stored team and
//! trims it to capacity, keeping first occurrences.
//!
//! Uses the same storage configuration as the server.

use anyhow::Context;
use pokemon_team_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pokemon_team_api::init_tracing();

    let config = Config::load();
    let roster = pokemon_team_api::open_store(&config)
        .await
        .context("Failed to open roster storage")?;

    let report = roster.repair().await.context("Failed to clean team")?;

    tracing::info!(removed = report.removed, "Team cleaned");
    for entry in &report.team {
        tracing::info!(
            entry_id = %entry.entry_id,
            pokemon_id = entry.pokemon_id,
            level = entry.level,
            "Remaining: {}",
            entry.name
        );
    }

    Ok(())
}
