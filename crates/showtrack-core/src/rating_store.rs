use anyhow::{anyhow, Result};
use bincode::{deserialize, serialize};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use showtrack_models::{UserId, UserRating};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Persistence for user rating documents, one document per user.
pub trait RatingStore: Send + Sync {
    fn get(&self, user_id: &str) -> Result<Option<UserRating>>;

    fn put(&self, ratings: &UserRating) -> Result<()>;

    fn clear(&self) -> Result<usize>;
}

/// Rating documents as gzip-compressed bincode, `<dir>/<user>.bin`.
pub struct FileRatingStore {
    dir: PathBuf,
}

impl FileRatingStore {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    fn document_path(&self, user_id: &str) -> PathBuf {
        // Percent-encoding keeps distinct user ids in distinct files and
        // never lets '/' escape the directory
        self.dir.join(format!("{}.bin", urlencoding::encode(user_id)))
    }
}

impl RatingStore for FileRatingStore {
    fn get(&self, user_id: &str) -> Result<Option<UserRating>> {
        let path = self.document_path(user_id);
        if !path.exists() {
            debug!("No rating document for user {}", user_id);
            return Ok(None);
        }

        let data = std::fs::read(&path)?;

        match decode_document(&data) {
            Ok(ratings) if ratings.user_id == user_id => Ok(Some(ratings)),
            Ok(ratings) => Err(anyhow!(
                "Rating document {:?} belongs to user {}, not {}",
                path,
                ratings.user_id,
                user_id
            )),
            Err(e) => {
                // Keep the unreadable document around; ratings are not refetchable
                let backup_path = path.with_extension("bin.bak");
                std::fs::rename(&path, &backup_path)?;
                warn!(
                    "Rating document for {} is unreadable ({}). Moved it to {:?} and starting fresh.",
                    user_id, e, backup_path
                );
                Ok(None)
            }
        }
    }

    fn put(&self, ratings: &UserRating) -> Result<()> {
        let start = std::time::Instant::now();
        let serialized = serialize(ratings)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&serialized)?;
        let encoded = encoder.finish()?;

        // Atomic write: write to temp file, then rename
        let path = self.document_path(&ratings.user_id);
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, encoded)?;
        std::fs::rename(&temp_path, &path)?;

        debug!(
            "Saved ratings for {}: {} series in {:?}",
            ratings.user_id,
            ratings.series.len(),
            start.elapsed()
        );
        Ok(())
    }

    fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("bin") {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        info!("Removed {} rating documents from {:?}", removed, self.dir);
        Ok(removed)
    }
}

fn decode_document(data: &[u8]) -> Result<UserRating> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(deserialize(&decompressed)?)
}

#[derive(Default)]
pub struct MemoryRatingStore {
    documents: RwLock<BTreeMap<UserId, UserRating>>,
}

impl MemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RatingStore for MemoryRatingStore {
    fn get(&self, user_id: &str) -> Result<Option<UserRating>> {
        let documents = self.documents.read().map_err(|_| anyhow!("rating store lock poisoned"))?;
        Ok(documents.get(user_id).cloned())
    }

    fn put(&self, ratings: &UserRating) -> Result<()> {
        let mut documents = self.documents.write().map_err(|_| anyhow!("rating store lock poisoned"))?;
        documents.insert(ratings.user_id.clone(), ratings.clone());
        Ok(())
    }

    fn clear(&self) -> Result<usize> {
        let mut documents = self.documents.write().map_err(|_| anyhow!("rating store lock poisoned"))?;
        let removed = documents.len();
        documents.clear();
        Ok(removed)
    }
}
