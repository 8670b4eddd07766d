use super::context::{load_config, load_credentials, resolve_paths};
use crate::output::Output;
use crate::ConfigCommands;
use chrono::Utc;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;
use showtrack_config::{Config, PathManager};

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let path_manager = resolve_paths();
    match cmd {
        ConfigCommands::Show { full } => show_config(&path_manager, full, output),
        ConfigCommands::ApiKey { key } => configure_api_key(&path_manager, key, output),
        ConfigCommands::Init { force } => init_config(&path_manager, force, output),
    }
}

fn show_config(path_manager: &PathManager, full: bool, output: &Output) -> Result<()> {
    let config_file = path_manager.config_file();
    let config = load_config(path_manager)?;
    let credentials = load_credentials(path_manager)?;
    let env_key = std::env::var("TMDB_API_KEY").is_ok();

    let api_key = credentials
        .resolve_tmdb_api_key()
        .map(|key| if full { key } else { mask_string(&key) })
        .unwrap_or_else(|| "<not set>".to_string());
    let scheduler = config.scheduler_or_default();

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "config_file_exists": config_file.exists(),
            "data_dir": path_manager.data_dir().display().to_string(),
            "api_key": api_key,
            "api_key_from_env": env_key,
            "api_key_saved_at": credentials.get_key_saved_at(),
            "catalog": config.catalog,
            "sync": config.sync,
            "scheduler": scheduler,
        }));
        return Ok(());
    }

    output.println(format!("{}", "Configuration".bright_cyan().bold()));
    output.println(format!(
        "  Config file:   {}{}",
        config_file.display(),
        if config_file.exists() { "" } else { " (not created, using defaults)" }
    ));
    output.println(format!("  Data dir:      {}", path_manager.data_dir().display()));
    output.println("");

    output.println(format!("{}", "Catalog".bold()));
    output.println(format!(
        "  API key:       {}{}",
        api_key,
        if env_key { " (from TMDB_API_KEY)" } else { "" }
    ));
    if let Some(saved_at) = credentials.get_key_saved_at() {
        output.println(format!("  Key saved:     {}", saved_at.format("%Y-%m-%d %H:%M UTC")));
    }
    output.println(format!("  Base URL:      {}", config.catalog.base_url));
    output.println(format!("  Language:      {}", config.catalog.language));
    output.println(format!("  Timeout:       {}s", config.catalog.request_timeout_secs));
    output.println("");

    output.println(format!("{}", "Sync".bold()));
    output.println(format!("  Season fetch concurrency: {}", config.sync.season_fetch_concurrency));
    output.println(format!("  Change window:            {} days", config.sync.change_window_days));
    output.println(format!(
        "  Deep episode check:       {}",
        if config.sync.deep_episode_check { "✓".green().to_string() } else { "✗".red().to_string() }
    ));
    output.println("");

    output.println(format!("{}", "Scheduler".bold()));
    output.println(format!("  Schedule:       {}", scheduler.schedule));
    output.println(format!("  Timezone:       {}", scheduler.timezone));
    output.println(format!(
        "  Run on startup: {}",
        if scheduler.run_on_startup { "✓".green().to_string() } else { "✗".red().to_string() }
    ));
    Ok(())
}

fn configure_api_key(path_manager: &PathManager, key: Option<String>, output: &Output) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => rpassword::prompt_password("TMDB API key: ")
            .map_err(|e| eyre!("Failed to read API key: {}", e))?,
    };
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(eyre!("API key cannot be empty"));
    }

    let mut credentials = load_credentials(path_manager)?;
    credentials.set_tmdb_api_key(key);
    credentials.set_key_saved_at(Utc::now());
    credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;

    output.success(format!(
        "TMDB API key saved to {}",
        path_manager.credentials_file().display()
    ));
    Ok(())
}

fn init_config(path_manager: &PathManager, force: bool, output: &Output) -> Result<()> {
    let config_file = path_manager.config_file();
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {}; use --force to overwrite",
            config_file.display()
        ));
        return Ok(());
    }

    let config = Config {
        scheduler: Some(showtrack_config::default_scheduler_config()),
        ..Config::default()
    };
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write config to {}: {}", config_file.display(), e))?;
    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.len() <= 4 {
        return "*".repeat(s.len());
    }
    format!("{}***{}", &s[..2], &s[s.len() - 2..])
}
