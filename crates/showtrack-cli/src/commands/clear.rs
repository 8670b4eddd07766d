use super::context::{load_credentials, resolve_paths};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use showtrack_config::PathManager;
use showtrack_core::{FileRatingStore, FileShowStore, RatingStore, ShowStore};
use std::fs;
use std::path::Path;

pub fn run_clear(
    all: bool,
    shows: bool,
    ratings: bool,
    stats: bool,
    credentials: bool,
    output: &Output,
) -> Result<()> {
    let path_manager = resolve_paths();

    if all {
        clear_shows(&path_manager, output)?;
        clear_ratings(&path_manager, output)?;
        clear_stats(&path_manager, output)?;
        clear_credentials(&path_manager, output)?;
        output.success("All stored data and credentials cleared");
        return Ok(());
    }

    let mut cleared_anything = false;

    if shows {
        clear_shows(&path_manager, output)?;
        cleared_anything = true;
    }

    if ratings {
        clear_ratings(&path_manager, output)?;
        cleared_anything = true;
    }

    if stats {
        clear_stats(&path_manager, output)?;
        cleared_anything = true;
    }

    if credentials {
        clear_credentials(&path_manager, output)?;
        cleared_anything = true;
    }

    if !cleared_anything {
        output.warn("No clear option specified. Use --shows, --ratings, --stats, --credentials, or --all");
        output.println("\nExample: showtrack clear --shows");
    }

    Ok(())
}

fn clear_shows(path_manager: &PathManager, output: &Output) -> Result<()> {
    let dir = path_manager.shows_dir();
    if !dir.exists() {
        output.info("No show store found to clear");
        return Ok(());
    }

    let removed = FileShowStore::new(&dir)
        .and_then(|store| store.clear())
        .map_err(|e| eyre!("Failed to clear show store at {}: {}", dir.display(), e))?;
    output.success(format!("Removed {} show document(s) from {}", removed, dir.display()));
    Ok(())
}

fn clear_ratings(path_manager: &PathManager, output: &Output) -> Result<()> {
    let dir = path_manager.ratings_dir();
    if !dir.exists() {
        output.info("No rating store found to clear");
        return Ok(());
    }

    let removed = FileRatingStore::new(&dir)
        .and_then(|store| store.clear())
        .map_err(|e| eyre!("Failed to clear rating store at {}: {}", dir.display(), e))?;
    output.success(format!("Removed {} rating document(s) from {}", removed, dir.display()));
    Ok(())
}

fn clear_stats(path_manager: &PathManager, output: &Output) -> Result<()> {
    let removed_stats = remove_file_if_exists(&path_manager.stats_file())?;
    let removed_images = remove_file_if_exists(&path_manager.image_config_file())?;

    if removed_stats || removed_images {
        output.success("Cleared counters and image configuration cache");
    } else {
        output.info("No counters or image configuration cache found to clear");
    }
    Ok(())
}

fn clear_credentials(path_manager: &PathManager, output: &Output) -> Result<()> {
    let mut store = load_credentials(path_manager)?;
    let keys = store.get_all_keys();
    if keys.is_empty() {
        output.info("No stored credentials found to clear");
        return Ok(());
    }

    for key in &keys {
        store.remove(key);
    }
    store
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
    output.success(format!("Cleared {} stored credential(s)", keys.len()));
    Ok(())
}

fn remove_file_if_exists(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).map_err(|e| eyre!("Failed to remove {}: {}", path.display(), e))?;
    Ok(true)
}
