use async_trait::async_trait;
use reqwest::StatusCode;

use crate::domain::errors::{RosterError, RosterResult};
use crate::domain::pokemon::Pokemon;
use crate::domain::repositories::PokemonSource;

/// Public PokeAPI base URL
pub const DEFAULT_POKEAPI_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// HTTP implementation of PokemonSource backed by PokeAPI
///
/// Requests carry no timeout and are never retried; a failure is reported
/// once and the caller decides what to tell the user.
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl PokeApiClient {
    /// Creates a client rooted at `base_url` (e.g. `https://pokeapi.co/api/v2`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn pokemon_url(&self, pokemon_id: u32) -> String {
        format!("{}/pokemon/{}", self.base_url, pokemon_id)
    }
}

impl Default for PokeApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_POKEAPI_BASE_URL)
    }
}

fn upstream_error(pokemon_id: u32, err: impl std::fmt::Display) -> RosterError {
    tracing::error!(pokemon_id, "Failed to fetch Pokémon: {}", err);
    RosterError::UpstreamUnavailable(err.to_string())
}

#[async_trait]
impl PokemonSource for PokeApiClient {
    async fn fetch(&self, pokemon_id: u32) -> RosterResult<Pokemon> {
        let url = self.pokemon_url(pokemon_id);
        tracing::debug!(%url, "Fetching Pokémon");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| upstream_error(pokemon_id, e))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(RosterError::InvalidEntry(format!(
                    "unknown Pokémon id {pokemon_id}"
                )));
            }
            status => {
                return Err(upstream_error(
                    pokemon_id,
                    format!("API returned status: {status}"),
                ));
            }
        }

        response
            .json::<Pokemon>()
            .await
            .map_err(|e| upstream_error(pokemon_id, e))
    }
}
