//! Integration tests for repository layer
//!
//! These tests verify that the JSON document and SQLite backends store and
//! reload the roster faithfully, and that the store keeps its rules when
//! running on top of them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use pokemon_team_api::config::StorageBackend;
use pokemon_team_api::domain::battle::BattleRecord;
use pokemon_team_api::domain::repositories::{RosterDocument, RosterRepository};
use pokemon_team_api::domain::roster::{
    validation, EntryId, NewRosterEntry, RosterEntry, RosterStore,
};
use pokemon_team_api::domain::RosterError;
use pokemon_team_api::infrastructure::connect_repository;
use pokemon_team_api::infrastructure::repositories::{
    JsonFileRosterRepository, SqliteRosterRepository,
};
use serde_json::json;
use tempfile::TempDir;

fn sample_document() -> RosterDocument {
    RosterDocument {
        team: vec![
            RosterEntry {
                entry_id: EntryId::new(1),
                pokemon_id: 25,
                name: "pikachu".to_string(),
                level: 12,
                added_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()),
            },
            RosterEntry {
                entry_id: EntryId::new(4),
                pokemon_id: 1,
                name: "bulbasaur".to_string(),
                level: 1,
                added_at: None,
            },
        ],
        battles: vec![BattleRecord {
            id: 1,
            pokemon1: "pikachu".to_string(),
            pokemon2: "bulbasaur".to_string(),
            winner: "bulbasaur".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap(),
        }],
        ..Default::default()
    }
}

async fn sqlite_repository() -> SqliteRosterRepository {
    SqliteRosterRepository::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database")
}

#[tokio::test]
async fn test_json_missing_file_is_empty_roster() {
    let dir = TempDir::new().unwrap();
    let repo = JsonFileRosterRepository::new(dir.path().join("db.json"));

    let document = repo.load().await.unwrap();

    assert_eq!(document, RosterDocument::default());
}

#[tokio::test]
async fn test_json_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("db.json");
    let repo = JsonFileRosterRepository::new(&path);

    repo.save(&sample_document()).await.unwrap();

    assert!(path.exists());
    assert!(!dir.path().join("nested").join("db.json.tmp").exists());
    assert_eq!(repo.load().await.unwrap(), sample_document());
}

#[tokio::test]
async fn test_json_reads_legacy_document_and_keeps_unknown_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    let legacy = json!({
        "team": [
            { "id": 1, "pokemonId": 25, "name": "pikachu", "timestamp": "2024-05-01T10:00:00.000Z" },
            { "id": "2", "pokemonId": 25, "name": "pikachu" },
            { "id": 3, "pokemonId": 4, "name": "charmander", "level": 7 }
        ],
        "favorites": [{ "id": 1, "pokemonId": 150 }]
    });
    std::fs::write(&path, serde_json::to_vec_pretty(&legacy).unwrap()).unwrap();

    let repo = Arc::new(JsonFileRosterRepository::new(&path));
    let document = repo.load().await.unwrap();
    assert_eq!(document.team.len(), 3);
    assert_eq!(document.team[1].entry_id, EntryId::new(2));
    assert_eq!(document.team[0].level, 1);
    assert_eq!(document.team[2].level, 7);
    assert!(document.battles.is_empty());

    // Repairing through the store rewrites the team and nothing else
    let store = RosterStore::new(repo.clone());
    let report = store.repair().await.unwrap();
    assert_eq!(report.removed, 1);

    let rewritten: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(rewritten["favorites"], legacy["favorites"]);
    assert_eq!(rewritten["team"].as_array().unwrap().len(), 2);
    assert_eq!(rewritten["team"][1]["entryId"], 3);
}

#[tokio::test]
async fn test_json_text_ids_load_repair_and_remove() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    let document = json!({
        "team": [
            { "id": "a1b2", "pokemonId": 25, "name": "pikachu" },
            { "id": "c3d4", "pokemonId": 25, "name": "pikachu" },
            { "id": 7, "pokemonId": 4, "name": "charmander" }
        ]
    });
    std::fs::write(&path, serde_json::to_vec_pretty(&document).unwrap()).unwrap();
    let store = RosterStore::new(Arc::new(JsonFileRosterRepository::new(&path)));

    let team = store.list().await.unwrap();
    assert_eq!(team[0].entry_id, EntryId::Text("a1b2".to_string()));
    assert_eq!(team[2].entry_id, EntryId::new(7));

    let report = store.repair().await.unwrap();
    assert_eq!(report.removed, 1);

    let removed = store.remove(EntryId::from("a1b2")).await.unwrap();
    assert_eq!(removed.pokemon_id, 25);

    // Allocation only looks at integer ids
    let entry = store.add(NewRosterEntry::new(1, "bulbasaur")).await.unwrap();
    assert_eq!(entry.entry_id, EntryId::new(8));

    let rewritten: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(rewritten["team"][0]["entryId"], 7);
    assert_eq!(rewritten["team"][1]["entryId"], 8);
}

/// Runs a repair directly on `repository` that stalls inside the update,
/// signalling once it holds the write lock
async fn stalled_repair(
    repository: Arc<dyn RosterRepository>,
    started: tokio::sync::oneshot::Sender<()>,
) -> pokemon_team_api::domain::RosterResult<()> {
    let mut started = Some(started);
    repository
        .update(&mut |document: &mut RosterDocument| {
            if let Some(started) = started.take() {
                let _ = started.send(());
            }
            std::thread::sleep(Duration::from_millis(200));

            let before = document.team.len();
            document.team = validation::repair(std::mem::take(&mut document.team));
            Ok(document.team.len() != before)
        })
        .await
}

fn pokemon_ids(team: &[RosterEntry]) -> Vec<u32> {
    team.iter().map(|e| e.pokemon_id).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_json_writers_in_separate_stores_take_turns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    let document = json!({
        "team": [
            { "id": 1, "pokemonId": 1, "name": "bulbasaur" },
            { "id": 2, "pokemonId": 1, "name": "bulbasaur" }
        ]
    });
    std::fs::write(&path, serde_json::to_vec_pretty(&document).unwrap()).unwrap();

    // The cleaner and the server each own a repository over the same file
    let cleaner: Arc<dyn RosterRepository> = Arc::new(JsonFileRosterRepository::new(&path));
    let server = RosterStore::new(Arc::new(JsonFileRosterRepository::new(&path)));

    let (started_tx, started_rx) = tokio::sync::oneshot::channel();
    let repair = tokio::spawn(stalled_repair(cleaner, started_tx));
    started_rx.await.unwrap();

    let added = server.add(NewRosterEntry::new(25, "pikachu")).await.unwrap();
    repair.await.unwrap().unwrap();

    let team = server.list().await.unwrap();
    assert_eq!(pokemon_ids(&team), vec![1, 25]);
    assert!(team.contains(&added));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sqlite_writers_on_separate_pools_take_turns() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("roster.db").display());

    let seed = SqliteRosterRepository::connect(&url).await.unwrap();
    let mut document = sample_document();
    document.team[1].pokemon_id = 25;
    seed.save(&document).await.unwrap();

    let cleaner: Arc<dyn RosterRepository> =
        Arc::new(SqliteRosterRepository::connect(&url).await.unwrap());
    let server = RosterStore::new(Arc::new(SqliteRosterRepository::connect(&url).await.unwrap()));

    let (started_tx, started_rx) = tokio::sync::oneshot::channel();
    let repair = tokio::spawn(stalled_repair(cleaner, started_tx));
    started_rx.await.unwrap();

    server.add(NewRosterEntry::new(133, "eevee")).await.unwrap();
    repair.await.unwrap().unwrap();

    let team = server.list().await.unwrap();
    assert_eq!(pokemon_ids(&team), vec![25, 133]);
}

#[tokio::test]
async fn test_sqlite_failed_change_rolls_back() {
    let repo = sqlite_repository().await;
    repo.save(&sample_document()).await.unwrap();

    let result = repo
        .update(&mut |document: &mut RosterDocument| {
            document.team.clear();
            Err(RosterError::CapacityExceeded)
        })
        .await;

    assert_eq!(result, Err(RosterError::CapacityExceeded));
    assert_eq!(repo.load().await.unwrap(), sample_document());
}

#[tokio::test]
async fn test_sqlite_keeps_text_ids() {
    let repo = sqlite_repository().await;
    let mut document = sample_document();
    document.team[0].entry_id = EntryId::from("a1b2");

    repo.save(&document).await.unwrap();

    assert_eq!(repo.load().await.unwrap(), document);
}

#[tokio::test]
async fn test_json_corrupt_file_is_persistence_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let repo = JsonFileRosterRepository::new(&path);
    let err = repo.load().await.unwrap_err();

    assert!(matches!(err, RosterError::PersistenceFailure(_)));
}

#[tokio::test]
async fn test_json_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");

    {
        let store = RosterStore::new(Arc::new(JsonFileRosterRepository::new(&path)));
        store.add(NewRosterEntry::new(25, "pikachu")).await.unwrap();
        store.add(NewRosterEntry::new(133, "eevee")).await.unwrap();
    }

    let store = RosterStore::new(Arc::new(JsonFileRosterRepository::new(&path)));
    let team = store.list().await.unwrap();
    assert_eq!(team.len(), 2);

    let err = store.add(NewRosterEntry::new(25, "pikachu")).await.unwrap_err();
    assert!(matches!(err, RosterError::DuplicateEntry { .. }));
}

#[tokio::test]
async fn test_sqlite_empty_database() {
    let repo = sqlite_repository().await;

    let document = repo.load().await.unwrap();

    assert!(document.team.is_empty());
    assert!(document.battles.is_empty());
}

#[tokio::test]
async fn test_sqlite_save_and_reload_keeps_order() {
    let repo = sqlite_repository().await;

    repo.save(&sample_document()).await.unwrap();
    let document = repo.load().await.unwrap();

    assert_eq!(document, sample_document());
    // Stored order is insertion order, not entry id order
    let mut reordered = sample_document();
    reordered.team.reverse();
    repo.save(&reordered).await.unwrap();
    assert_eq!(repo.load().await.unwrap().team, reordered.team);
}

#[tokio::test]
async fn test_sqlite_save_replaces_previous_state() {
    let repo = sqlite_repository().await;
    repo.save(&sample_document()).await.unwrap();

    repo.save(&RosterDocument::default()).await.unwrap();

    assert_eq!(repo.load().await.unwrap(), RosterDocument::default());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sqlite_store_concurrent_adds_at_five() {
    let store = Arc::new(RosterStore::new(Arc::new(sqlite_repository().await)));
    for id in 1..=5 {
        store
            .add(NewRosterEntry::new(id, format!("pokemon-{id}")))
            .await
            .unwrap();
    }

    let handles: Vec<_> = [100, 200]
        .into_iter()
        .map(|id| {
            let store = store.clone();
            tokio::spawn(async move { store.add(NewRosterEntry::new(id, "late")).await })
        })
        .collect();

    let mut successes = 0;
    let mut rejections = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(RosterError::CapacityExceeded) => rejections += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!((successes, rejections), (1, 1));
    assert_eq!(store.list().await.unwrap().len(), 6);
}

#[tokio::test]
async fn test_connect_repository_selects_backend() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("team.json");

    let repo = connect_repository(&StorageBackend::JsonFile(path.clone()))
        .await
        .unwrap();
    repo.save(&sample_document()).await.unwrap();
    assert!(path.exists());

    let repo = connect_repository(&StorageBackend::Sqlite("sqlite::memory:".to_string()))
        .await
        .unwrap();
    assert!(repo.load().await.unwrap().team.is_empty());

    let repo = connect_repository(&StorageBackend::Memory).await.unwrap();
    repo.save(&sample_document()).await.unwrap();
    assert_eq!(repo.load().await.unwrap(), sample_document());
}
