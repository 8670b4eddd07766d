use super::context::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;
use showtrack_core::ShowStore;

pub async fn run_show(show_id: u64, poster_size: Option<usize>, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let show = ctx
        .engine
        .show_store()
        .get(show_id)
        .map_err(|e| eyre!("Failed to read show {}: {}", show_id, e))?
        .ok_or_else(|| eyre!("Show {} is not stored. Run 'showtrack load {}' first.", show_id, show_id))?;

    let poster_url = match (poster_size, show.poster_path.as_deref()) {
        (Some(size), Some(path)) => ctx
            .images
            .poster_url(size, path)
            .await
            .map_err(|e| eyre!("Failed to resolve poster URL: {:#}", e))?,
        _ => None,
    };

    let projection = show.to_projection();
    if !output.is_human() {
        output.json(&json!({ "show": projection, "poster_url": poster_url }));
        return Ok(());
    }

    let year = projection
        .air_date
        .as_deref()
        .and_then(|d| d.get(..4))
        .unwrap_or("????");
    output.println(format!("{} ({})", projection.name.bright_cyan().bold(), year));
    if let Some(status) = &projection.status {
        output.println(format!("  Status:  {}", status));
    }
    if let Some(imdb_id) = &projection.imdb_id {
        output.println(format!("  IMDb:    {}", imdb_id));
    }
    if let Some(url) = &poster_url {
        output.println(format!("  Poster:  {}", url));
    }
    output.println(format!(
        "  Seasons: {} declared, {} stored",
        projection.number_of_seasons,
        projection.seasons.len()
    ));

    for season in &projection.seasons {
        output.println(format!(
            "\n  {} {}",
            format!("Season {}", season.number).bold(),
            season.name.as_deref().unwrap_or("").bright_black()
        ));
        for episode in &season.episodes {
            output.println(format!(
                "    {:>3}  {}  {}",
                episode.number,
                episode.air_date.as_deref().unwrap_or("          "),
                episode.name.as_deref().unwrap_or("")
            ));
        }
    }
    Ok(())
}

pub async fn run_search(query: &str, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let results = ctx.engine.catalog().search_shows(query).await?;

    let mut hits = Vec::with_capacity(results.len());
    for summary in results {
        let stored = ctx
            .engine
            .show_store()
            .contains(summary.id)
            .map_err(|e| eyre!("Failed to read show store: {}", e))?;
        hits.push((summary, stored));
    }

    if !output.is_human() {
        let data: Vec<_> = hits
            .iter()
            .map(|(summary, stored)| json!({ "show": summary, "stored": stored }))
            .collect();
        output.json(&json!(data));
        return Ok(());
    }

    if hits.is_empty() {
        output.info(format!("No shows found for '{}'", query));
        return Ok(());
    }

    for (summary, stored) in &hits {
        let year = summary
            .first_air_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .unwrap_or("????");
        let marker = if *stored { "✓".green().to_string() } else { " ".to_string() };
        output.println(format!(
            "{} {:>8}  {} ({})",
            marker,
            summary.id.bright_black(),
            summary.name,
            year
        ));
    }
    Ok(())
}
