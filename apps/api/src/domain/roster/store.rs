use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::entry::{EntryId, NewRosterEntry, RosterEntry};
use super::validation;
use crate::domain::battle::{BattleRecord, NewBattle};
use crate::domain::errors::{RosterError, RosterResult};
use crate::domain::repositories::{RosterDocument, RosterRepository};

/// Result of a maintenance pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairReport {
    /// Number of entries dropped as duplicates or over capacity
    pub removed: usize,
    /// The team as stored after the pass
    pub team: Vec<RosterEntry>,
}

/// Authoritative owner of the roster.
///
/// Every write is a single [`RosterRepository::update`], so the check and
/// the save happen under the backend's write lock and two concurrent adds
/// can never both see a free slot, even from different processes. Reads
/// take no lock.
///
/// # Invariants
/// - At most `ROSTER_CAPACITY` entries after any committed write
/// - No two entries share a `pokemon_id` after any committed write
pub struct RosterStore {
    repository: Arc<dyn RosterRepository>,
}

/// Takes the value a document change captured; a backend that skipped the
/// change is a persistence bug
fn applied<T>(outcome: Option<T>) -> RosterResult<T> {
    outcome.ok_or_else(|| {
        RosterError::PersistenceFailure("roster update finished without applying".to_string())
    })
}

impl RosterStore {
    /// Creates a store over the given persistence backend
    pub fn new(repository: Arc<dyn RosterRepository>) -> Self {
        Self { repository }
    }

    /// Current team, in insertion order
    pub async fn list(&self) -> RosterResult<Vec<RosterEntry>> {
        Ok(self.repository.load().await?.team)
    }

    /// Appends a new entry to the team
    ///
    /// # Returns
    /// * `Ok(RosterEntry)` - The stored entry with its fresh `entry_id`
    /// * `Err(CapacityExceeded)` - The team already holds six entries
    /// * `Err(DuplicateEntry)` - The Pokémon is already on the team
    /// * `Err(InvalidEntry)` - The candidate itself is malformed
    pub async fn add(&self, candidate: NewRosterEntry) -> RosterResult<RosterEntry> {
        let mut added = None;

        self.repository
            .update(&mut |document: &mut RosterDocument| {
                if let Err(err) = validation::check_candidate(&document.team, &candidate) {
                    tracing::warn!(
                        pokemon_id = candidate.pokemon_id,
                        team_size = document.team.len(),
                        "Rejected team entry: {}",
                        err
                    );
                    return Err(err);
                }

                let entry_id = EntryId::next_after(document.team.iter().map(|e| &e.entry_id));
                let entry = candidate.clone().into_entry(entry_id, Utc::now());
                document.team.push(entry.clone());
                added = Some((entry, document.team.len()));
                Ok(true)
            })
            .await?;

        let (entry, team_size) = applied(added)?;
        tracing::info!(
            entry_id = %entry.entry_id,
            pokemon_id = entry.pokemon_id,
            team_size,
            "Added {} to team",
            entry.name
        );

        Ok(entry)
    }

    /// Removes the entry with the given id and returns it
    pub async fn remove(&self, entry_id: EntryId) -> RosterResult<RosterEntry> {
        let mut removed = None;

        self.repository
            .update(&mut |document: &mut RosterDocument| {
                let position = document
                    .team
                    .iter()
                    .position(|e| e.entry_id == entry_id)
                    .ok_or_else(|| RosterError::NotFound(entry_id.clone()))?;

                removed = Some((document.team.remove(position), document.team.len()));
                Ok(true)
            })
            .await?;

        let (entry, team_size) = applied(removed)?;
        tracing::info!(
            entry_id = %entry.entry_id,
            pokemon_id = entry.pokemon_id,
            team_size,
            "Removed {} from team",
            entry.name
        );

        Ok(entry)
    }

    /// Drops duplicates and entries over capacity, first occurrence wins
    ///
    /// Nothing is written when the team is already consistent.
    pub async fn repair(&self) -> RosterResult<RepairReport> {
        let mut report = None;

        self.repository
            .update(&mut |document: &mut RosterDocument| {
                let before = document.team.len();
                document.team = validation::repair(std::mem::take(&mut document.team));
                let removed = before - document.team.len();

                report = Some(RepairReport {
                    removed,
                    team: document.team.clone(),
                });
                Ok(removed > 0)
            })
            .await?;

        let report = applied(report)?;
        if report.removed > 0 {
            tracing::info!(
                removed = report.removed,
                team_size = report.team.len(),
                "Team cleaned"
            );
        } else {
            tracing::debug!("Team already consistent, nothing to clean");
        }

        Ok(report)
    }

    /// Battle history, oldest first
    pub async fn battles(&self) -> RosterResult<Vec<BattleRecord>> {
        Ok(self.repository.load().await?.battles)
    }

    /// Appends a battle result to the history
    pub async fn record_battle(&self, battle: NewBattle) -> RosterResult<BattleRecord> {
        let mut recorded = None;

        self.repository
            .update(&mut |document: &mut RosterDocument| {
                let id = document.battles.iter().map(|b| b.id).max().unwrap_or(0) + 1;
                let record = battle.clone().into_record(id, Utc::now());
                document.battles.push(record.clone());
                recorded = Some(record);
                Ok(true)
            })
            .await?;

        let record = applied(recorded)?;
        tracing::info!(
            battle_id = record.id,
            "Recorded battle {} vs {}, winner {}",
            record.pokemon1,
            record.pokemon2,
            record.winner
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::InMemoryRosterRepository;

    fn store() -> RosterStore {
        RosterStore::new(Arc::new(InMemoryRosterRepository::new()))
    }

    fn store_with(team: Vec<RosterEntry>) -> RosterStore {
        let document = RosterDocument {
            team,
            ..Default::default()
        };
        RosterStore::new(Arc::new(InMemoryRosterRepository::with_document(document)))
    }

    fn raw_entry(entry_id: u64, pokemon_id: u32) -> RosterEntry {
        RosterEntry {
            entry_id: EntryId::new(entry_id),
            pokemon_id,
            name: format!("pokemon-{pokemon_id}"),
            level: 1,
            added_at: None,
        }
    }

    async fn fill(store: &RosterStore, pokemon_ids: impl IntoIterator<Item = u32>) {
        for id in pokemon_ids {
            store
                .add(NewRosterEntry::new(id, format!("pokemon-{id}")))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn add_then_duplicate() {
        let store = store();

        let entry = store.add(NewRosterEntry::new(25, "pikachu")).await.unwrap();
        assert_eq!(entry.entry_id, EntryId::new(1));
        assert_eq!(entry.level, 1);
        assert!(entry.added_at.is_some());
        assert_eq!(store.list().await.unwrap().len(), 1);

        let err = store.add(NewRosterEntry::new(25, "pikachu")).await.unwrap_err();
        assert!(matches!(err, RosterError::DuplicateEntry { pokemon_id: 25, .. }));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn full_team_rejects_new_pokemon() {
        let store = store();
        fill(&store, 1..=6).await;

        let before = store.list().await.unwrap();
        let err = store.add(NewRosterEntry::new(150, "mewtwo")).await.unwrap_err();

        assert_eq!(err, RosterError::CapacityExceeded);
        assert_eq!(store.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn insertion_order_is_preserved() {
        let store = store();
        fill(&store, [7, 1, 4]).await;

        let ids: Vec<u32> = store.list().await.unwrap().iter().map(|e| e.pokemon_id).collect();
        assert_eq!(ids, vec![7, 1, 4]);
    }

    #[tokio::test]
    async fn remove_missing_entry_is_not_found() {
        let store = store();
        fill(&store, [1, 2]).await;
        let before = store.list().await.unwrap();

        let err = store.remove(EntryId::new(42)).await.unwrap_err();

        assert_eq!(err, RosterError::NotFound(EntryId::new(42)));
        assert_eq!(store.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn remove_frees_a_slot() {
        let store = store();
        fill(&store, 1..=6).await;

        let removed = store.remove(EntryId::new(3)).await.unwrap();
        assert_eq!(removed.pokemon_id, 3);

        let entry = store.add(NewRosterEntry::new(3, "venusaur")).await.unwrap();
        assert_eq!(entry.entry_id, EntryId::new(7));
        assert_eq!(store.list().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn invariants_hold_across_mixed_operations() {
        let store = store();
        let pokemon = [1, 2, 1, 3, 4, 5, 6, 7, 2, 8, 9, 4];

        for (step, id) in pokemon.into_iter().enumerate() {
            let _ = store.add(NewRosterEntry::new(id, format!("p{id}"))).await;
            if step % 4 == 3 {
                let first = store.list().await.unwrap()[0].entry_id.clone();
                store.remove(first).await.unwrap();
            }

            let team = store.list().await.unwrap();
            assert!(validation::is_consistent(&team), "violated at step {step}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_at_five_admit_exactly_one() {
        let store = Arc::new(store());
        fill(&store, 1..=5).await;

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.add(NewRosterEntry::new(100, "a")).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.add(NewRosterEntry::new(200, "b")).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let capacity_errors = results
            .iter()
            .filter(|r| matches!(r, Err(RosterError::CapacityExceeded)))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(capacity_errors, 1);
        assert_eq!(store.list().await.unwrap().len(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_adds_admit_one() {
        let store = Arc::new(store());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.add(NewRosterEntry::new(25, "pikachu")).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn repair_cleans_inconsistent_team() {
        let raw = [1, 2, 1, 3, 4, 2, 5, 6, 7]
            .into_iter()
            .enumerate()
            .map(|(i, id)| raw_entry(i as u64 + 1, id))
            .collect();
        let store = store_with(raw);

        let report = store.repair().await.unwrap();
        let ids: Vec<u32> = report.team.iter().map(|e| e.pokemon_id).collect();

        assert_eq!(report.removed, 3);
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(store.list().await.unwrap(), report.team);

        let again = store.repair().await.unwrap();
        assert_eq!(again.removed, 0);
        assert_eq!(again.team, report.team);
    }

    #[tokio::test]
    async fn battles_are_appended_with_increasing_ids() {
        let store = store();

        let first = store
            .record_battle(NewBattle {
                pokemon1: "pikachu".to_string(),
                pokemon2: "snorlax".to_string(),
                winner: "snorlax".to_string(),
            })
            .await
            .unwrap();
        let second = store
            .record_battle(NewBattle {
                pokemon1: "eevee".to_string(),
                pokemon2: "onix".to_string(),
                winner: "onix".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.battles().await.unwrap(), vec![first, second]);
        // battles never touch the team
        assert!(store.list().await.unwrap().is_empty());
    }
}
