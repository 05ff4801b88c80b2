use async_trait::async_trait;

use crate::domain::errors::RosterResult;
use crate::domain::pokemon::Pokemon;

/// Read-only source of Pokémon data
#[async_trait]
pub trait PokemonSource: Send + Sync {
    /// Fetch a Pokémon by its numeric id
    ///
    /// Any failure to obtain a usable record is `UpstreamUnavailable`.
    async fn fetch(&self, pokemon_id: u32) -> RosterResult<Pokemon>;
}
