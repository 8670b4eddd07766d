use anyhow::{anyhow, Result};
use showtrack_models::{Show, ShowId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Persistence for show documents, one document per show id.
///
/// Writes are whole-document and last-writer-wins.
pub trait ShowStore: Send + Sync {
    fn get(&self, id: ShowId) -> Result<Option<Show>>;

    fn upsert(&self, show: &Show) -> Result<()>;

    fn list_ids(&self) -> Result<Vec<ShowId>>;

    fn contains(&self, id: ShowId) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Remove every document, returning how many were removed
    fn clear(&self) -> Result<usize>;
}

/// Show documents as pretty JSON files, `<dir>/<id>.json`.
#[derive(Clone)]
pub struct FileShowStore {
    dir: PathBuf,
}

impl FileShowStore {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    fn show_path(&self, id: ShowId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl ShowStore for FileShowStore {
    fn get(&self, id: ShowId) -> Result<Option<Show>> {
        let path = self.show_path(id);
        if !path.exists() {
            debug!("Show {} not in store", id);
            return Ok(None);
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read show file for {}: {}", id, e);
                return Ok(None);
            }
        };

        match serde_json::from_str::<Show>(&content) {
            Ok(show) => Ok(Some(show)),
            Err(e) => {
                warn!("Show document {} is corrupted: {}. Deleting corrupted file.", id, e);
                if let Err(rm_err) = std::fs::remove_file(&path) {
                    warn!("Failed to delete corrupted show file: {}", rm_err);
                }
                Ok(None)
            }
        }
    }

    fn upsert(&self, show: &Show) -> Result<()> {
        let path = self.show_path(show.id);
        let json = serde_json::to_string_pretty(show)?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, json)
            .map_err(|e| anyhow!("Failed to write show {}: {}", show.id, e))?;
        std::fs::rename(&temp_path, &path)?;

        debug!("Saved show {} ({} seasons)", show.id, show.seasons.len());
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<ShowId>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<ShowId>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn clear(&self) -> Result<usize> {
        let ids = self.list_ids()?;
        for id in &ids {
            std::fs::remove_file(self.show_path(*id))?;
        }
        info!("Removed {} show documents from {:?}", ids.len(), self.dir);
        Ok(ids.len())
    }
}

/// In-process show store
#[derive(Default)]
pub struct MemoryShowStore {
    shows: RwLock<BTreeMap<ShowId, Show>>,
}

impl MemoryShowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShowStore for MemoryShowStore {
    fn get(&self, id: ShowId) -> Result<Option<Show>> {
        let shows = self.shows.read().map_err(|_| anyhow!("show store lock poisoned"))?;
        Ok(shows.get(&id).cloned())
    }

    fn upsert(&self, show: &Show) -> Result<()> {
        let mut shows = self.shows.write().map_err(|_| anyhow!("show store lock poisoned"))?;
        shows.insert(show.id, show.clone());
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<ShowId>> {
        let shows = self.shows.read().map_err(|_| anyhow!("show store lock poisoned"))?;
        Ok(shows.keys().copied().collect())
    }

    fn clear(&self) -> Result<usize> {
        let mut shows = self.shows.write().map_err(|_| anyhow!("show store lock poisoned"))?;
        let removed = shows.len();
        shows.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::show_payload;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileShowStore::new(dir.path()).unwrap();
        let show = Show::from_payload(show_payload(1399, 3), Utc::now());

        assert!(store.get(1399).unwrap().is_none());
        store.upsert(&show).unwrap();

        assert_eq!(store.get(1399).unwrap(), Some(show));
        assert_eq!(store.list_ids().unwrap(), vec![1399]);
        assert!(store.contains(1399).unwrap());
    }

    #[test]
    fn test_corrupted_file_is_removed_and_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = FileShowStore::new(dir.path()).unwrap();
        let path = dir.path().join("77.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(store.get(77).unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_list_ids_skips_foreign_files() {
        let dir = TempDir::new().unwrap();
        let store = FileShowStore::new(dir.path()).unwrap();
        store.upsert(&Show::from_payload(show_payload(20, 1), Utc::now())).unwrap();
        store.upsert(&Show::from_payload(show_payload(3, 1), Utc::now())).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("draft.json"), "{}").unwrap();

        assert_eq!(store.list_ids().unwrap(), vec![3, 20]);
        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.list_ids().unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_upsert_replaces() {
        let store = MemoryShowStore::new();
        let mut show = Show::from_payload(show_payload(5, 2), Utc::now());
        store.upsert(&show).unwrap();
        show.name = "Renamed".to_string();
        store.upsert(&show).unwrap();

        assert_eq!(store.get(5).unwrap().unwrap().name, "Renamed");
        assert_eq!(store.list_ids().unwrap(), vec![5]);
    }
}
