use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use showtrack_catalog::CatalogClient;
use showtrack_models::ImageConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Image configuration rarely changes; refetch it monthly.
const IMAGE_CONFIG_MAX_AGE_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize)]
struct CachedImageConfig {
    fetched_at: DateTime<Utc>,
    config: ImageConfig,
}

pub struct ImageConfigCache {
    catalog: Arc<dyn CatalogClient>,
    path: PathBuf,
    max_age: Duration,
}

impl ImageConfigCache {
    pub fn new(catalog: Arc<dyn CatalogClient>, path: &Path) -> Self {
        Self {
            catalog,
            path: path.to_path_buf(),
            max_age: Duration::days(IMAGE_CONFIG_MAX_AGE_DAYS),
        }
    }

    /// Image configuration, refetched when the cached copy is older than
    /// 30 days. A stale copy is still returned when the refetch yields
    /// nothing.
    pub async fn get(&self) -> Result<Option<ImageConfig>> {
        let cached = self.load();
        if let Some(ref cached) = cached {
            if Utc::now() - cached.fetched_at < self.max_age {
                debug!("Using cached image config from {}", cached.fetched_at);
                return Ok(Some(cached.config.clone()));
            }
        }

        let fetched = self
            .catalog
            .fetch_image_config()
            .await
            .context("Failed to fetch image configuration")?;

        match fetched {
            Some(config) => {
                self.save(&config)?;
                info!("Refreshed image configuration from {}", self.catalog.provider_name());
                Ok(Some(config))
            }
            None => {
                warn!("Catalog returned no image configuration");
                Ok(cached.map(|cached| cached.config))
            }
        }
    }

    pub async fn poster_url(&self, size_index: usize, poster_path: &str) -> Result<Option<String>> {
        Ok(self
            .get()
            .await?
            .and_then(|config| config.poster_url(size_index, poster_path)))
    }

    fn load(&self) -> Option<CachedImageConfig> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!("Ignoring unreadable image config cache {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn save(&self, config: &ImageConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let cached = CachedImageConfig {
            fetched_at: Utc::now(),
            config: config.clone(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&cached)?)?;
        Ok(())
    }
}
