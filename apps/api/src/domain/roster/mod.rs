// Roster domain module
// Contains the roster entry model, the shared roster rules and the store

pub mod entry;
pub mod store;
pub mod validation;

/// Maximum number of entries on a team
pub const ROSTER_CAPACITY: usize = 6;

// Re-export main types for convenience
pub use entry::{EntryId, NewRosterEntry, RosterEntry};
pub use store::{RepairReport, RosterStore};
