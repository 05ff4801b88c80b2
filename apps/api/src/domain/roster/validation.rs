//! Roster rules shared by the server-side store and the client-side guard.
//!
//! Both call sites go through [`check_candidate`], and the maintenance pass
//! goes through [`repair`], so the capacity and uniqueness rules live in
//! exactly one place.

use std::collections::HashSet;

use super::entry::{NewRosterEntry, RosterEntry};
use super::ROSTER_CAPACITY;
use crate::domain::errors::{RosterError, RosterResult};

/// Highest level a roster entry may carry
pub const MAX_LEVEL: u32 = 100;

/// Validates the candidate on its own, without looking at the roster
///
/// # Rules
/// - `pokemonId` must be positive
/// - Name must not be blank
/// - Level, when given, must be within `1..=MAX_LEVEL`
pub fn validate_candidate(candidate: &NewRosterEntry) -> RosterResult<()> {
    if candidate.pokemon_id == 0 {
        return Err(RosterError::InvalidEntry(
            "pokemonId must be a positive integer".to_string(),
        ));
    }

    if candidate.name.trim().is_empty() {
        return Err(RosterError::InvalidEntry("name cannot be empty".to_string()));
    }

    if let Some(level) = candidate.level {
        if !(1..=MAX_LEVEL).contains(&level) {
            return Err(RosterError::InvalidEntry(format!(
                "level must be between 1 and {MAX_LEVEL}"
            )));
        }
    }

    Ok(())
}

/// Checks whether `candidate` may be appended to `team`
///
/// Capacity is checked before uniqueness, so a full team reports
/// `CapacityExceeded` even when the candidate is also a duplicate.
pub fn check_candidate(team: &[RosterEntry], candidate: &NewRosterEntry) -> RosterResult<()> {
    validate_candidate(candidate)?;

    if team.len() >= ROSTER_CAPACITY {
        return Err(RosterError::CapacityExceeded);
    }

    if team.iter().any(|e| e.pokemon_id == candidate.pokemon_id) {
        return Err(RosterError::DuplicateEntry {
            pokemon_id: candidate.pokemon_id,
            name: candidate.name.trim().to_string(),
        });
    }

    Ok(())
}

/// Returns true when the team satisfies both the capacity and uniqueness rules
pub fn is_consistent(team: &[RosterEntry]) -> bool {
    let mut seen = HashSet::with_capacity(team.len());
    team.len() <= ROSTER_CAPACITY && team.iter().all(|e| seen.insert(e.pokemon_id))
}

/// Restores capacity and uniqueness on a team.
///
/// Walks the team in order and keeps an entry only if no earlier kept entry
/// has the same `pokemon_id`, stopping once `ROSTER_CAPACITY` entries are
/// kept. Idempotent.
pub fn repair(team: Vec<RosterEntry>) -> Vec<RosterEntry> {
    let mut seen = HashSet::with_capacity(ROSTER_CAPACITY);
    let mut kept = Vec::with_capacity(ROSTER_CAPACITY.min(team.len()));

    for entry in team {
        if kept.len() == ROSTER_CAPACITY {
            break;
        }
        if seen.insert(entry.pokemon_id) {
            kept.push(entry);
        }
    }

    kept
}
