//! One pretty-printed JSON file per save.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use saga_model::SaveId;
use tokio::fs;

use super::{decode_meta, decode_save, PersistError, SaveGameData, SaveGameMeta};
use crate::ports::SaveStore;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &SaveId) -> PathBuf {
        let file_name: String = id
            .as_str()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

fn io_error(id: &SaveId, e: std::io::Error) -> PersistError {
    if e.kind() == ErrorKind::NotFound {
        PersistError::NotFound(id.clone())
    } else {
        PersistError::Io(e)
    }
}

#[async_trait]
impl SaveStore for JsonFileStore {
    async fn init(&self) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    async fn save(&self, data: &SaveGameData) -> Result<SaveGameMeta, PersistError> {
        let content = serde_json::to_string_pretty(data)?;
        let path = self.path_for(&data.id);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, &content).await?;
        fs::rename(&tmp, &path).await?;

        tracing::info!(save_id = %data.id, path = %path.display(), "saved game");
        Ok(data.meta(content.len() as u64))
    }

    async fn load(&self, id: &SaveId) -> Result<SaveGameData, PersistError> {
        let content = fs::read_to_string(self.path_for(id))
            .await
            .map_err(|e| io_error(id, e))?;
        let save = decode_save(&content)?;
        tracing::info!(save_id = %id, "loaded game");
        Ok(save)
    }

    async fn list(&self) -> Result<Vec<SaveGameMeta>, PersistError> {
        let mut saves = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let content = fs::read_to_string(&path).await?;
                match decode_meta(&content) {
                    Ok(meta) => saves.push(meta),
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable save"),
                }
            }
        }

        saves.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(saves)
    }

    async fn delete(&self, id: &SaveId) -> Result<(), PersistError> {
        fs::remove_file(self.path_for(id))
            .await
            .map_err(|e| io_error(id, e))?;
        tracing::info!(save_id = %id, "deleted save");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::TurnHistory;
    use saga_model::KnowledgeBase;

    fn save(id: &str, currency: i64) -> SaveGameData {
        let mut kb = KnowledgeBase::new();
        kb.player_stats.currency = currency;
        SaveGameData::new(SaveId::from(id), "Journey", kb, Vec::new(), TurnHistory::new())
    }

    #[tokio::test]
    async fn test_save_load_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("saves"));
        store.init().await.unwrap();

        let meta = store.save(&save("save-a", 120)).await.unwrap();
        assert!(meta.size > 0);
        store.save(&save("save-b", 5)).await.unwrap();

        let loaded = store.load(&SaveId::from("save-a")).await.unwrap();
        assert_eq!(loaded.knowledge_base.player_stats.currency, 120);

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);

        store.delete(&SaveId::from("save-a")).await.unwrap();
        assert!(matches!(
            store.load(&SaveId::from("save-a")).await,
            Err(PersistError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&SaveId::from("save-a")).await,
            Err(PersistError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_newer_save_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        let mut data = save("save-future", 1);
        data.app_version = "42.0.0".into();
        store.save(&data).await.unwrap();

        assert!(matches!(
            store.load(&data.id).await,
            Err(PersistError::IncompatibleVersion { .. })
        ));
    }

    #[test]
    fn test_ids_are_sanitized_into_file_names() {
        let store = JsonFileStore::new("/tmp/saves");
        let path = store.path_for(&SaveId::from("../evil/id"));
        assert_eq!(path, PathBuf::from("/tmp/saves/___evil_id.json"));
    }
}
