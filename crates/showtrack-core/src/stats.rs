use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Number of shows the last nightly sync updated.
pub const LAST_NIGHTLY_SYNC_SHOW_UPDATE_COUNT: &str = "last_nightly_sync_show_update_count";

/// Named operational counters.
pub trait CounterStore: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<u64>>;

    fn set(&self, name: &str, value: u64) -> Result<()>;

    fn all(&self) -> Result<BTreeMap<String, u64>>;
}

/// Counters in a flat TOML file (`name = value`).
pub struct FileCounterStore {
    path: PathBuf,
    // Serializes read-modify-write of the file within this process
    lock: RwLock<()>,
}

impl FileCounterStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            lock: RwLock::new(()),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, u64>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl CounterStore for FileCounterStore {
    fn get(&self, name: &str) -> Result<Option<u64>> {
        let _guard = self.lock.read().map_err(|_| anyhow!("counter store lock poisoned"))?;
        Ok(self.load()?.get(name).copied())
    }

    fn set(&self, name: &str, value: u64) -> Result<()> {
        let _guard = self.lock.write().map_err(|_| anyhow!("counter store lock poisoned"))?;
        let mut counters = self.load()?;
        counters.insert(name.to_string(), value);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string_pretty(&counters)?)?;
        debug!(counter = name, value = value, "Counter updated");
        Ok(())
    }

    fn all(&self) -> Result<BTreeMap<String, u64>> {
        let _guard = self.lock.read().map_err(|_| anyhow!("counter store lock poisoned"))?;
        self.load()
    }
}

#[derive(Default)]
pub struct MemoryCounterStore {
    counters: RwLock<BTreeMap<String, u64>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounterStore {
    fn get(&self, name: &str) -> Result<Option<u64>> {
        let counters = self.counters.read().map_err(|_| anyhow!("counter store lock poisoned"))?;
        Ok(counters.get(name).copied())
    }

    fn set(&self, name: &str, value: u64) -> Result<()> {
        let mut counters = self.counters.write().map_err(|_| anyhow!("counter store lock poisoned"))?;
        counters.insert(name.to_string(), value);
        Ok(())
    }

    fn all(&self) -> Result<BTreeMap<String, u64>> {
        let counters = self.counters.read().map_err(|_| anyhow!("counter store lock poisoned"))?;
        Ok(counters.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_counter_store_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.toml");

        let store = FileCounterStore::new(&path);
        assert_eq!(store.get(LAST_NIGHTLY_SYNC_SHOW_UPDATE_COUNT).unwrap(), None);
        store.set(LAST_NIGHTLY_SYNC_SHOW_UPDATE_COUNT, 12).unwrap();
        store.set("other", 1).unwrap();
        store.set(LAST_NIGHTLY_SYNC_SHOW_UPDATE_COUNT, 2).unwrap();

        let reopened = FileCounterStore::new(&path);
        assert_eq!(reopened.get(LAST_NIGHTLY_SYNC_SHOW_UPDATE_COUNT).unwrap(), Some(2));
        assert_eq!(reopened.all().unwrap().len(), 2);
    }
}
