use thiserror::Error;

use super::roster::{EntryId, ROSTER_CAPACITY};

/// Errors that can occur while reading or mutating the roster
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("Team is full. You can only have {} Pokémon in your team.", ROSTER_CAPACITY)]
    CapacityExceeded,

    #[error("{name} is already in your team")]
    DuplicateEntry { pokemon_id: u32, name: String },

    #[error("Invalid team entry: {0}")]
    InvalidEntry(String),

    #[error("Team entry not found: {0}")]
    NotFound(EntryId),

    #[error("Pokémon data source unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Roster persistence failed: {0}")]
    PersistenceFailure(String),

    #[error("Roster service unreachable: {0}")]
    Unreachable(String),
}

impl RosterError {
    /// Stable machine-readable code carried in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            RosterError::CapacityExceeded => "capacity_exceeded",
            RosterError::DuplicateEntry { .. } => "duplicate_entry",
            RosterError::InvalidEntry(_) => "invalid_entry",
            RosterError::NotFound(_) => "not_found",
            RosterError::UpstreamUnavailable(_) => "upstream_unavailable",
            RosterError::PersistenceFailure(_) => "persistence_failure",
            RosterError::Unreachable(_) => "unreachable",
        }
    }

    /// Returns true for conditions the user caused and can fix themselves
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            RosterError::CapacityExceeded
                | RosterError::DuplicateEntry { .. }
                | RosterError::InvalidEntry(_)
                | RosterError::NotFound(_)
        )
    }

    /// Message shown to the user.
    ///
    /// Infrastructure failures collapse into a generic message; the detail
    /// only goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            RosterError::UpstreamUnavailable(_) => {
                "Could not reach the Pokémon data source. Please try again.".to_string()
            }
            RosterError::PersistenceFailure(_) | RosterError::Unreachable(_) => {
                "Something went wrong while updating your team. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type RosterResult<T> = Result<T, RosterError>;
