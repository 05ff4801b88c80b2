use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;

use crate::domain::errors::{RosterError, RosterResult};
use crate::domain::repositories::{DocumentChange, RosterDocument, RosterRepository};

/// JSON document implementation of RosterRepository
///
/// Stores the whole roster document in one pretty-printed JSON file, the
/// layout the original mock server used, so an existing `db.json` can be
/// served as is. Writes go to a sibling temp file which is then renamed over
/// the target, so readers never see a half-written document.
///
/// Updates hold an exclusive advisory lock on a sibling `<name>.lock` file,
/// so writers in different processes sharing the same document take turns.
pub struct JsonFileRosterRepository {
    path: PathBuf,
}

impl JsonFileRosterRepository {
    /// Creates a new JsonFileRosterRepository
    ///
    /// # Arguments
    /// * `path` - Location of the JSON document; it need not exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling_path(".tmp")
    }

    fn lock_path(&self) -> PathBuf {
        self.sibling_path(".lock")
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "db.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    async fn create_parent_dir(&self) -> RosterResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| persistence_error(&self.path, "create directory for", e))?;
        }
        Ok(())
    }

    /// Blocks until this process holds the document's write lock
    ///
    /// The lock is released when the returned file is dropped.
    async fn lock(&self) -> RosterResult<File> {
        self.create_parent_dir().await?;

        let path = self.lock_path();
        let result = tokio::task::spawn_blocking({
            let path = path.clone();
            move || -> std::io::Result<File> {
                let file = OpenOptions::new()
                    .create(true)
                    .truncate(false)
                    .write(true)
                    .open(&path)?;
                FileExt::lock_exclusive(&file)?;
                Ok(file)
            }
        })
        .await;

        match result {
            Ok(Ok(file)) => Ok(file),
            Ok(Err(e)) => Err(persistence_error(&path, "lock", e)),
            Err(e) => Err(persistence_error(&path, "lock", e)),
        }
    }
}

fn persistence_error(path: &Path, action: &str, err: impl std::fmt::Display) -> RosterError {
    tracing::error!(path = %path.display(), "Failed to {} roster document: {}", action, err);
    RosterError::PersistenceFailure(format!("failed to {} {}: {}", action, path.display(), err))
}

#[async_trait]
impl RosterRepository for JsonFileRosterRepository {
    async fn load(&self) -> RosterResult<RosterDocument> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RosterDocument::default()),
            Err(e) => return Err(persistence_error(&self.path, "read", e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(RosterDocument::default());
        }

        serde_json::from_slice(&bytes).map_err(|e| persistence_error(&self.path, "parse", e))
    }

    async fn save(&self, document: &RosterDocument) -> RosterResult<()> {
        let json = serde_json::to_vec_pretty(document)
            .map_err(|e| persistence_error(&self.path, "serialize", e))?;

        self.create_parent_dir().await?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| persistence_error(&temp, "write", e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| persistence_error(&self.path, "replace", e))?;

        Ok(())
    }

    async fn update(&self, change: &mut DocumentChange<'_>) -> RosterResult<()> {
        let _lock = self.lock().await?;
        let mut document = self.load().await?;

        if change(&mut document)? {
            self.save(&document).await?;
        }

        Ok(())
    }
}
