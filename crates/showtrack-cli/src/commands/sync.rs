use super::context::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use showtrack_core::{LoadOutcome, UpdateOutcome};

pub async fn run_load(show_id: u64, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let outcome = ctx
        .engine
        .load_new(show_id)
        .await
        .map_err(|e| eyre!("Failed to load show {}: {:#}", show_id, e))?;

    if !output.is_human() {
        output.json(&json!({ "show_id": show_id, "result": outcome }));
        return Ok(());
    }

    match outcome {
        LoadOutcome::Loaded {
            seasons_loaded,
            seasons_missing,
        } => {
            output.success(format!(
                "Loaded show {} with {} season(s)",
                show_id,
                seasons_loaded.len()
            ));
            if !seasons_missing.is_empty() {
                output.warn(format!(
                    "Catalog did not deliver season(s) {}",
                    join_numbers(&seasons_missing)
                ));
            }
        }
        LoadOutcome::AlreadyPresent => {
            output.info(format!(
                "Show {} is already stored; use 'showtrack update {}' to refresh it",
                show_id, show_id
            ));
        }
        LoadOutcome::NotFound => output.error(format!("Show {} not found in the catalog", show_id)),
    }
    Ok(())
}

pub async fn run_update(show_id: u64, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let outcome = ctx
        .engine
        .incremental_update(show_id)
        .await
        .map_err(|e| eyre!("Failed to update show {}: {:#}", show_id, e))?;

    if !output.is_human() {
        output.json(&json!({ "show_id": show_id, "result": outcome }));
        return Ok(());
    }

    match outcome {
        UpdateOutcome::Updated { refreshed_seasons } if refreshed_seasons.is_empty() => {
            output.success(format!("Updated show {} (no season changes)", show_id));
        }
        UpdateOutcome::Updated { refreshed_seasons } => {
            output.success(format!(
                "Updated show {}, refreshed season(s) {}",
                show_id,
                join_numbers(&refreshed_seasons)
            ));
        }
        UpdateOutcome::NotTracked => {
            output.warn(format!(
                "Show {} is not stored; use 'showtrack load {}' first",
                show_id, show_id
            ));
        }
        UpdateOutcome::NotFound => {
            output.warn(format!(
                "Show {} is no longer in the catalog; keeping the stored copy",
                show_id
            ));
        }
    }
    Ok(())
}

pub async fn run_nightly(output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let report = ctx
        .engine
        .bulk_nightly_sync()
        .await
        .map_err(|e| eyre!("Nightly sync failed: {:#}", e))?;

    if !output.is_human() {
        output.json(&serde_json::to_value(&report)?);
        return Ok(());
    }

    output.success(format!(
        "Nightly sync updated {} of {} stored show(s) changed in the catalog ({} changed overall)",
        report.updated, report.matched_local, report.changed_in_feed
    ));
    if report.failed > 0 {
        output.warn(format!("{} show(s) failed to update; see the log for details", report.failed));
    }
    Ok(())
}

pub(crate) fn join_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
