use super::context::{open_reconciler, resolve_paths, AppContext};
use super::sync::join_numbers;
use crate::output::Output;
use crate::WatchlistCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;
use showtrack_core::{AddOutcome, WatchlistEntry};
use showtrack_models::ChangeSet;
use std::io::Read;
use std::path::Path;

pub fn run_rate(user_id: &str, file: &Path, output: &Output) -> Result<()> {
    let content = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)
            .map_err(|e| eyre!("Failed to read change-set {}: {}", file.display(), e))?
    };

    let changes = parse_change_set(&content)?;
    let paths = resolve_paths();
    let ratings = open_reconciler(&paths)?
        .apply_changes(user_id, &changes)
        .map_err(|e| eyre!("Failed to apply rating changes: {:#}", e))?;

    if !output.is_human() {
        output.json(&json!({ "user_id": user_id, "ratings": ratings.to_projection() }));
        return Ok(());
    }

    let show_ids: Vec<String> = changes.keys().map(|id| id.to_string()).collect();
    output.success(format!(
        "Applied changes to {} show(s) for user '{}': {}",
        changes.len(),
        user_id,
        show_ids.join(", ")
    ));
    Ok(())
}

pub async fn run_watchlist(user_id: &str, cmd: WatchlistCommands, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let watchlist = ctx.watchlist();

    match cmd {
        WatchlistCommands::Add { show_id } => {
            let outcome = watchlist
                .add(user_id, show_id)
                .await
                .map_err(|e| eyre!("Failed to add show {}: {:#}", show_id, e))?;
            if !output.is_human() {
                output.json(&json!({ "show_id": show_id, "result": outcome }));
                return Ok(());
            }
            match outcome {
                AddOutcome::Added => output.success(format!("Added show {} to the watchlist", show_id)),
                AddOutcome::AlreadyTracked => output.info(format!("Show {} is already on the watchlist", show_id)),
                AddOutcome::NotFound => output.error(format!("Show {} not found in the catalog", show_id)),
            }
        }
        WatchlistCommands::Remove { show_id } => {
            watchlist
                .remove(user_id, show_id)
                .map_err(|e| eyre!("Failed to remove show {}: {:#}", show_id, e))?;
            output.success(format!("Removed show {} from the watchlist", show_id));
        }
        WatchlistCommands::Watched {
            show_id,
            season,
            episode,
        } => {
            watchlist
                .mark_watched(user_id, show_id, season, episode)
                .map_err(|e| eyre!("Failed to mark episode watched: {:#}", e))?;
            output.success(format!("Marked {} S{:02}E{:02} watched", show_id, season, episode));
        }
        WatchlistCommands::List => {
            let entries = watchlist
                .list(user_id)
                .map_err(|e| eyre!("Failed to read watchlist: {:#}", e))?;
            if !output.is_human() {
                output.json(&json!(entries));
                return Ok(());
            }
            if entries.is_empty() {
                output.info(format!("Watchlist of '{}' is empty", user_id));
                return Ok(());
            }
            for entry in &entries {
                output.println(format_entry(entry));
            }
        }
    }
    Ok(())
}

fn parse_change_set(content: &str) -> Result<ChangeSet> {
    serde_json::from_str(content).map_err(|e| eyre!("Invalid change-set: {}", e))
}

fn format_entry(entry: &WatchlistEntry) -> String {
    let rating = entry.rating["rating"].as_u64().unwrap_or(0);
    let rating = if rating > 0 {
        format!("{}/10", rating).yellow().to_string()
    } else {
        "unrated".bright_black().to_string()
    };

    let fully_watched: Vec<u32> = entry
        .show
        .seasons
        .iter()
        .filter(|season| entry.rating["seasons"][season.number.to_string()]["fully_watched"] == json!(true))
        .map(|season| season.number)
        .collect();

    let mut line = format!(
        "{:>8}  {}  {}  {} episode(s) watched",
        entry.show.id,
        entry.show.name.bold(),
        rating,
        entry.watched_episodes
    );
    if !fully_watched.is_empty() {
        line.push_str(&format!(", seasons {} complete", join_numbers(&fully_watched)));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_change_set() {
        let changes = parse_change_set(
            r#"{"1399": {"rating": 9, "seasons": {"1": {"episodes": {"2": {"watched": true}}}}}}"#,
        )
        .unwrap();
        let series = &changes[&1399];
        assert_eq!(series.rating, Some(9));
        assert!(series.seasons.is_some());
    }

    #[test]
    fn test_parse_change_set_rejects_non_numeric_show_id() {
        assert!(parse_change_set(r#"{"abc": {"rating": 1}}"#).is_err());
    }
}
