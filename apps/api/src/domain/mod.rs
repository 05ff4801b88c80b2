// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod battle;
pub mod errors;
pub mod pokemon;
pub mod repositories;
pub mod roster;

pub use errors::{RosterError, RosterResult};
