//! Save game persistence.
//!
//! A save embeds the full knowledge base, the message log and the turn
//! history, tagged with the version of the engine that wrote it.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use saga_model::{GameMessage, KnowledgeBase, SaveId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::TurnHistory;

/// Version tag written into every save.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save {0} not found")]
    NotFound(SaveId),

    #[error("save written by version {found} cannot be read by version {current}")]
    IncompatibleVersion { found: String, current: String },

    #[error("invalid save format: {0}")]
    InvalidFormat(String),
}

/// Everything needed to resume a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveGameData {
    pub id: SaveId,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub knowledge_base: KnowledgeBase,
    pub game_messages: Vec<GameMessage>,
    #[serde(default)]
    pub history: TurnHistory,
    pub app_version: String,
}

impl SaveGameData {
    /// Create a save stamped with the current time and engine version.
    pub fn new(
        id: SaveId,
        name: impl Into<String>,
        knowledge_base: KnowledgeBase,
        game_messages: Vec<GameMessage>,
        history: TurnHistory,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            timestamp: Utc::now(),
            knowledge_base,
            game_messages,
            history,
            app_version: APP_VERSION.to_string(),
        }
    }

    pub fn meta(&self, size: u64) -> SaveGameMeta {
        SaveGameMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            timestamp: self.timestamp,
            size,
        }
    }
}

/// Listing entry for a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveGameMeta {
    pub id: SaveId,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    /// Serialized size in bytes.
    pub size: u64,
}

/// Header fields read before deserializing a whole save.
#[derive(Deserialize)]
struct SaveHeader {
    id: SaveId,
    name: String,
    timestamp: DateTime<Utc>,
    app_version: String,
}

impl SaveHeader {
    fn into_meta(self, size: u64) -> SaveGameMeta {
        SaveGameMeta {
            id: self.id,
            name: self.name,
            timestamp: self.timestamp,
            size,
        }
    }
}

/// Reject saves written by a newer major version.
pub fn check_version(found: &str) -> Result<(), PersistError> {
    let found_major = major_version(found)?;
    let current_major = major_version(APP_VERSION)?;
    if found_major > current_major {
        return Err(PersistError::IncompatibleVersion {
            found: found.to_string(),
            current: APP_VERSION.to_string(),
        });
    }
    Ok(())
}

fn major_version(version: &str) -> Result<u64, PersistError> {
    version
        .split('.')
        .next()
        .and_then(|major| major.trim().parse().ok())
        .ok_or_else(|| PersistError::InvalidFormat(format!("bad version tag '{}'", version)))
}

/// Parse a serialized save, checking its version tag first.
pub(crate) fn decode_save(content: &str) -> Result<SaveGameData, PersistError> {
    let header: SaveHeader = serde_json::from_str(content)?;
    check_version(&header.app_version)?;
    let mut save: SaveGameData = serde_json::from_str(content)?;
    if !save.knowledge_base.auto_save.is_well_formed() {
        tracing::warn!(save_id = %save.id, "repairing malformed auto-save ring");
        save.knowledge_base.auto_save.repair();
    }
    Ok(save)
}

pub(crate) fn decode_meta(content: &str) -> Result<SaveGameMeta, PersistError> {
    let header: SaveHeader = serde_json::from_str(content)?;
    Ok(header.into_meta(content.len() as u64))
}
