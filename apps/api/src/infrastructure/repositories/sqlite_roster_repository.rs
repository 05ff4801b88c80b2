use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::domain::battle::BattleRecord;
use crate::domain::errors::{RosterError, RosterResult};
use crate::domain::repositories::{DocumentChange, RosterDocument, RosterRepository};
use crate::domain::roster::{EntryId, RosterEntry};

/// SQLite implementation of RosterRepository
///
/// The team lives in `roster_entries` ordered by `position`, the battle
/// history in `battles`. A save rewrites both tables inside one transaction.
/// An update reads and rewrites inside one `BEGIN IMMEDIATE` transaction, so
/// SQLite's write lock keeps other connections and processes out until it
/// commits. Unknown top-level document fields have no table and are not kept.
pub struct SqliteRosterRepository {
    pool: SqlitePool,
}

impl SqliteRosterRepository {
    /// Creates a new SqliteRosterRepository over an existing pool
    ///
    /// The schema must already exist; see [`SqliteRosterRepository::migrate`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens `database_url` and creates the schema if needed
    ///
    /// A single connection is kept for the life of the pool so that
    /// `sqlite::memory:` databases survive between calls.
    pub async fn connect(database_url: &str) -> RosterResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url)
            .await
            .map_err(|e| db_error("connect to", e))?;

        let repo = Self::new(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    /// Creates the tables if they do not exist yet
    pub async fn migrate(&self) -> RosterResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS roster_entries (
                entry_id   TEXT    PRIMARY KEY,
                position   INTEGER NOT NULL,
                pokemon_id INTEGER NOT NULL,
                name       TEXT    NOT NULL,
                level      INTEGER NOT NULL DEFAULT 1,
                added_at   TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("create roster_entries in", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS battles (
                id        INTEGER PRIMARY KEY,
                pokemon1  TEXT NOT NULL,
                pokemon2  TEXT NOT NULL,
                winner    TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("create battles in", e))?;

        Ok(())
    }
}

fn db_error(action: &str, err: sqlx::Error) -> RosterError {
    tracing::error!("Failed to {} roster database: {}", action, err);
    RosterError::PersistenceFailure(format!("failed to {} roster database: {}", action, err))
}

fn to_i64<T>(value: T) -> RosterResult<i64>
where
    T: TryInto<i64> + Copy + std::fmt::Display,
{
    value.try_into().map_err(|_| {
        RosterError::PersistenceFailure(format!("{value} does not fit in an SQLite integer"))
    })
}

fn from_i64<T>(value: i64) -> Result<T, sqlx::Error>
where
    T: TryFrom<i64>,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    T::try_from(value).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn entry_from_row(row: &SqliteRow) -> Result<RosterEntry, sqlx::Error> {
    Ok(RosterEntry {
        entry_id: EntryId::from(row.try_get::<String, _>("entry_id")?),
        pokemon_id: from_i64(row.try_get("pokemon_id")?)?,
        name: row.try_get("name")?,
        level: from_i64(row.try_get("level")?)?,
        added_at: row.try_get::<Option<DateTime<Utc>>, _>("added_at")?,
    })
}

fn battle_from_row(row: &SqliteRow) -> Result<BattleRecord, sqlx::Error> {
    Ok(BattleRecord {
        id: from_i64(row.try_get("id")?)?,
        pokemon1: row.try_get("pokemon1")?,
        pokemon2: row.try_get("pokemon2")?,
        winner: row.try_get("winner")?,
        timestamp: row.try_get("timestamp")?,
    })
}

async fn read_document(conn: &mut SqliteConnection) -> RosterResult<RosterDocument> {
    let team: Vec<RosterEntry> = sqlx::query(
        r#"
        SELECT entry_id, pokemon_id, name, level, added_at
        FROM roster_entries
        ORDER BY position
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .and_then(|rows| rows.iter().map(entry_from_row).collect())
    .map_err(|e| db_error("read team from", e))?;

    let battles: Vec<BattleRecord> = sqlx::query(
        r#"
        SELECT id, pokemon1, pokemon2, winner, timestamp
        FROM battles
        ORDER BY id
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .and_then(|rows| rows.iter().map(battle_from_row).collect())
    .map_err(|e| db_error("read battles from", e))?;

    Ok(RosterDocument {
        team,
        battles,
        ..Default::default()
    })
}

/// Rewrites both tables; the caller owns the surrounding transaction
async fn write_document(conn: &mut SqliteConnection, document: &RosterDocument) -> RosterResult<()> {
    sqlx::query("DELETE FROM roster_entries")
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("clear team in", e))?;

    for (position, entry) in document.team.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO roster_entries (entry_id, position, pokemon_id, name, level, added_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.entry_id.to_string())
        .bind(to_i64(position)?)
        .bind(i64::from(entry.pokemon_id))
        .bind(&entry.name)
        .bind(i64::from(entry.level))
        .bind(entry.added_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("write team to", e))?;
    }

    sqlx::query("DELETE FROM battles")
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("clear battles in", e))?;

    for battle in &document.battles {
        sqlx::query(
            r#"
            INSERT INTO battles (id, pokemon1, pokemon2, winner, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(to_i64(battle.id)?)
        .bind(&battle.pokemon1)
        .bind(&battle.pokemon2)
        .bind(&battle.winner)
        .bind(battle.timestamp)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("write battles to", e))?;
    }

    Ok(())
}

#[async_trait]
impl RosterRepository for SqliteRosterRepository {
    async fn load(&self) -> RosterResult<RosterDocument> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("acquire connection to", e))?;

        read_document(&mut conn).await
    }

    async fn save(&self, document: &RosterDocument) -> RosterResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin transaction on", e))?;

        write_document(&mut tx, document).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit transaction on", e))?;

        Ok(())
    }

    async fn update(&self, change: &mut DocumentChange<'_>) -> RosterResult<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("acquire connection to", e))?;

        // IMMEDIATE takes the write lock up front instead of on first write
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(|e| db_error("begin transaction on", e))?;

        let result = async {
            let mut document = read_document(&mut conn).await?;
            if change(&mut document)? {
                write_document(&mut conn, &document).await?;
            }
            Ok::<(), RosterError>(())
        }
        .await;

        match result {
            Ok(()) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| db_error("commit transaction on", e))?;
                Ok(())
            }
            Err(err) => {
                if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    tracing::error!("Failed to roll back roster update: {}", e);
                }
                Err(err)
            }
        }
    }
}
