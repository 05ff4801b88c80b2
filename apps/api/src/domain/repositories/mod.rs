// Ports implemented by the infrastructure layer

pub mod pokemon_source;
pub mod roster_repository;

pub use pokemon_source::PokemonSource;
pub use roster_repository::{DocumentChange, RosterDocument, RosterRepository};
