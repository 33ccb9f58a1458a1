//! In-memory save store, for tests and ephemeral sessions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use saga_model::SaveId;
use tokio::sync::RwLock;

use super::{decode_meta, decode_save, PersistError, SaveGameData, SaveGameMeta};
use crate::ports::SaveStore;

/// Keeps serialized saves keyed by id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saves: RwLock<BTreeMap<SaveId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.saves.read().await.len()
    }

    pub async fn contains(&self, id: &SaveId) -> bool {
        self.saves.read().await.contains_key(id)
    }
}

#[async_trait]
impl SaveStore for MemoryStore {
    async fn init(&self) -> Result<(), PersistError> {
        Ok(())
    }

    async fn save(&self, data: &SaveGameData) -> Result<SaveGameMeta, PersistError> {
        let content = serde_json::to_string(data)?;
        let meta = data.meta(content.len() as u64);
        self.saves.write().await.insert(data.id.clone(), content);
        Ok(meta)
    }

    async fn load(&self, id: &SaveId) -> Result<SaveGameData, PersistError> {
        let saves = self.saves.read().await;
        let content = saves
            .get(id)
            .ok_or_else(|| PersistError::NotFound(id.clone()))?;
        decode_save(content)
    }

    async fn list(&self) -> Result<Vec<SaveGameMeta>, PersistError> {
        let saves = self.saves.read().await;
        let mut metas = saves
            .values()
            .map(|content| decode_meta(content))
            .collect::<Result<Vec<_>, _>>()?;
        metas.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(metas)
    }

    async fn delete(&self, id: &SaveId) -> Result<(), PersistError> {
        self.saves
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PersistError::NotFound(id.clone()))
    }
}
