use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identity of one roster slot.
///
/// Assigned by the store at creation time and independent of the Pokémon the
/// slot references. The store only ever hands out integers, but documents
/// written by other tools may carry arbitrary string ids, so both forms are
/// kept. A string holding a plain integer reads as that integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum EntryId {
    Number(u64),
    Text(String),
}

impl EntryId {
    pub fn new(value: u64) -> Self {
        Self::Number(value)
    }

    /// The integer form, if this id has one
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Next free integer id after every integer id in `ids`, starting at 1
    ///
    /// String ids are skipped; they never collide with a fresh integer id.
    pub fn next_after<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a EntryId>,
    {
        let max = ids.into_iter().filter_map(EntryId::as_number).max();
        Self::Number(max.unwrap_or(0) + 1)
    }
}

impl From<&str> for EntryId {
    fn from(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }
}

impl From<String> for EntryId {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(Self::Number(n)),
            RawId::Text(s) if s.trim().is_empty() => {
                Err(serde::de::Error::custom("entry id cannot be empty"))
            }
            RawId::Text(s) => Ok(Self::from(s)),
        }
    }
}

fn default_level() -> u32 {
    1
}

/// One stored roster record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    #[serde(alias = "id")]
    pub entry_id: EntryId,
    pub pokemon_id: u32,
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default, alias = "timestamp", skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

/// A prospective roster entry, before the store has given it an identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRosterEntry {
    pub pokemon_id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl NewRosterEntry {
    pub fn new(pokemon_id: u32, name: impl Into<String>) -> Self {
        Self {
            pokemon_id,
            name: name.into(),
            level: None,
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    /// Turns the candidate into a stored entry
    pub fn into_entry(self, entry_id: EntryId, added_at: DateTime<Utc>) -> RosterEntry {
        RosterEntry {
            entry_id,
            pokemon_id: self.pokemon_id,
            name: self.name.trim().to_string(),
            level: self.level.unwrap_or_else(default_level),
            added_at: Some(added_at),
        }
    }
}
