// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod in_memory_roster_repository;
pub mod json_file_roster_repository;
pub mod sqlite_roster_repository;

pub use in_memory_roster_repository::InMemoryRosterRepository;
pub use json_file_roster_repository::JsonFileRosterRepository;
pub use sqlite_roster_repository::SqliteRosterRepository;
