use color_eyre::eyre::eyre;
use color_eyre::Result;
use showtrack_catalog::{CatalogClient, TmdbClient};
use showtrack_config::{container_base_path, Config, CredentialStore, PathManager};
use showtrack_core::{
    FileCounterStore, FileRatingStore, FileShowStore, ImageConfigCache, RatingReconciler,
    SyncEngine, SyncOptions, WatchlistService,
};
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs to talk to the catalog and the local stores.
pub struct AppContext {
    pub config: Config,
    pub engine: Arc<SyncEngine>,
    pub reconciler: RatingReconciler,
    pub images: ImageConfigCache,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let paths = resolve_paths();
        paths
            .ensure_directories()
            .map_err(|e| eyre!("Failed to create data directories: {}", e))?;
        let config = load_config(&paths)?;

        let api_key = load_credentials(&paths)?
            .resolve_tmdb_api_key()
            .ok_or_else(|| {
                eyre!("No TMDB API key configured. Run 'showtrack config api-key' or set TMDB_API_KEY.")
            })?;

        let catalog: Arc<dyn CatalogClient> =
            Arc::new(TmdbClient::from_config(api_key, &config.catalog)?);

        let shows = FileShowStore::new(&paths.shows_dir())
            .map_err(|e| eyre!("Failed to open show store: {}", e))?;
        let counters = FileCounterStore::new(&paths.stats_file());

        let engine = Arc::new(SyncEngine::new(
            catalog.clone(),
            Arc::new(shows),
            Arc::new(counters),
            SyncOptions::from(&config.sync),
        ));
        let images = ImageConfigCache::new(catalog, &paths.image_config_file());

        debug!("Using data directory {}", paths.data_dir().display());

        Ok(Self {
            reconciler: open_reconciler(&paths)?,
            config,
            engine,
            images,
        })
    }

    pub fn watchlist(&self) -> WatchlistService {
        WatchlistService::new(self.engine.clone(), self.reconciler.clone())
    }
}

/// Container runs keep everything under one mounted base path.
pub fn resolve_paths() -> PathManager {
    if is_container() {
        PathManager::from_docker_env()
    } else {
        PathManager::default()
    }
}

pub fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;
    Ok(config)
}

pub fn load_credentials(paths: &PathManager) -> Result<CredentialStore> {
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    Ok(credentials)
}

pub fn is_container() -> bool {
    std::path::Path::new("/.dockerenv").exists()
        || container_base_path().exists()
        || std::fs::read_to_string("/proc/self/cgroup")
            .map(|s| s.contains("docker") || s.contains("containerd") || s.contains("podman"))
            .unwrap_or(false)
}

/// Rating reconciler over the on-disk rating store. Needs no catalog access.
pub fn open_reconciler(paths: &PathManager) -> Result<RatingReconciler> {
    let ratings = FileRatingStore::new(&paths.ratings_dir())
        .map_err(|e| eyre!("Failed to open rating store: {}", e))?;
    Ok(RatingReconciler::new(Arc::new(ratings)))
}
