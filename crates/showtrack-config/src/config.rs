use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

/// Catalog provider (TMDB) connection settings.
///
/// The API key itself lives in the credential store or in `TMDB_API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Cooldown used when a 429 response carries no Retry-After header
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How many season fetches a show load may run at once
    #[serde(default = "default_season_fetch_concurrency")]
    pub season_fetch_concurrency: usize,
    /// Oldest start date the provider's change feeds accept, in days
    #[serde(default = "default_change_window_days")]
    pub change_window_days: i64,
    /// Also ask the per-season episode change feed for unflagged seasons
    #[serde(default)]
    pub deep_episode_check: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 6-field cron expression (seconds first), evaluated in UTC
    #[serde(default = "default_schedule")]
    pub schedule: String,
    /// Informational only: the daemon warns when this is not UTC. The
    /// default is taken from `TZ` when the section omits it.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json_logging")]
    pub json: bool,
    pub file: Option<PathBuf>,
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_retry_after_secs() -> u64 {
    10
}

fn default_season_fetch_concurrency() -> usize {
    4
}

fn default_change_window_days() -> i64 {
    14
}

fn default_schedule() -> String {
    "0 0 3 * * *".to_string()  // Nightly at 03:00
}

fn default_timezone() -> String {
    std::env::var("TZ").unwrap_or_else(|_| "UTC".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logging() -> bool {
    use std::io::IsTerminal;
    !std::io::stdout().is_terminal()
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        schedule: default_schedule(),
        timezone: default_timezone(),
        run_on_startup: false,
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            language: default_language(),
            request_timeout_secs: default_request_timeout_secs(),
            default_retry_after_secs: default_retry_after_secs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            season_fetch_concurrency: default_season_fetch_concurrency(),
            change_window_days: default_change_window_days(),
            deep_episode_check: false,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.catalog.base_url.is_empty() {
            return Err(anyhow::anyhow!("catalog.base_url cannot be empty"));
        }
        if !self.catalog.base_url.starts_with("http://") && !self.catalog.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!("catalog.base_url must be an http(s) URL: {}", self.catalog.base_url));
        }
        if self.catalog.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("catalog.request_timeout_secs must be positive"));
        }
        if self.sync.season_fetch_concurrency == 0 {
            return Err(anyhow::anyhow!("sync.season_fetch_concurrency must be at least 1"));
        }
        if self.sync.change_window_days <= 0 {
            return Err(anyhow::anyhow!("sync.change_window_days must be positive"));
        }
        if let Some(ref scheduler) = self.scheduler {
            // tokio-cron-scheduler expects six fields (seconds first)
            let fields = scheduler.schedule.split_whitespace().count();
            if fields != 6 && fields != 7 {
                return Err(anyhow::anyhow!(
                    "scheduler.schedule must be a 6-field cron expression (sec min hour day month weekday): {}",
                    scheduler.schedule
                ));
            }
        }
        Ok(())
    }

    pub fn scheduler_or_default(&self) -> SchedulerConfig {
        self.scheduler.clone().unwrap_or_else(default_scheduler_config)
    }
}
