use serde::{Deserialize, Serialize};

use super::battle::BattleStats;
use super::errors::{RosterError, RosterResult};

const ARTWORK_BASE_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

/// A named reference as returned by the upstream API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonStat {
    pub base_stat: u32,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonTypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

/// Pokémon as supplied by the upstream data source.
///
/// Only the fields the service reads are modelled; everything else in the
/// upstream payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub stats: Vec<PokemonStat>,
    #[serde(default)]
    pub types: Vec<PokemonTypeSlot>,
}

impl Pokemon {
    /// Base value of the named stat, if the upstream listed it
    pub fn base_stat(&self, name: &str) -> Option<u32> {
        self.stats
            .iter()
            .find(|s| s.stat.name == name)
            .map(|s| s.base_stat)
    }

    /// Stats used to decide a battle
    ///
    /// Fails with `UpstreamUnavailable` when the upstream record is missing
    /// one of them, since the record is then unusable.
    pub fn battle_stats(&self) -> RosterResult<BattleStats> {
        let stat = |name: &str| {
            self.base_stat(name).ok_or_else(|| {
                RosterError::UpstreamUnavailable(format!("{} has no {} stat", self.name, name))
            })
        };

        Ok(BattleStats {
            hp: stat("hp")?,
            attack: stat("attack")?,
            speed: stat("speed")?,
        })
    }

    /// Primary type name, if any
    pub fn primary_type(&self) -> Option<&str> {
        self.types
            .iter()
            .min_by_key(|t| t.slot)
            .map(|t| t.kind.name.as_str())
    }

    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }

    pub fn artwork_url(&self) -> String {
        artwork_url(self.id)
    }
}

/// Capitalises the first letter of an upstream name (`pikachu` -> `Pikachu`)
pub fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Official artwork sprite for a Pokémon id
pub fn artwork_url(pokemon_id: u32) -> String {
    format!("{ARTWORK_BASE_URL}/{pokemon_id}.png")
}
