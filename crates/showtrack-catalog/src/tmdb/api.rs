//! TMDB v3 wire types and their mapping onto the catalog payload models.

use serde::Deserialize;
use serde_json::Value;
use showtrack_models::{
    ChangeEntry, ChangeItem, ChangeKind, EpisodePayload, ImageConfig, SeasonPayload, ShowPayload,
    ShowSummary,
};

#[derive(Debug, Deserialize)]
struct TmdbShow {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    status: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    number_of_seasons: Option<u32>,
    number_of_episodes: Option<u32>,
    external_ids: Option<TmdbExternalIds>,
}

#[derive(Debug, Deserialize)]
struct TmdbExternalIds {
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeason {
    id: Option<u64>,
    season_number: u32,
    name: Option<String>,
    air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    #[serde(default)]
    episodes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TmdbEpisode {
    id: Option<u64>,
    episode_number: u32,
    name: Option<String>,
    air_date: Option<String>,
    overview: Option<String>,
    still_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TmdbChangedPage {
    #[serde(default)]
    pub results: Vec<TmdbChangedId>,
    pub page: Option<u32>,
    pub total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TmdbChangedId {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
struct TmdbChanges {
    #[serde(default)]
    changes: Vec<TmdbChange>,
}

#[derive(Debug, Deserialize)]
struct TmdbChange {
    key: String,
    #[serde(default)]
    items: Vec<TmdbChangeItem>,
}

#[derive(Debug, Deserialize)]
struct TmdbChangeItem {
    id: Option<String>,
    action: Option<String>,
    time: Option<String>,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchPage {
    #[serde(default)]
    results: Vec<TmdbSearchResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResult {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbConfiguration {
    images: ImageConfig,
}

// TMDB sends "" for unknown dates
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

pub(crate) fn parse_show(raw: Value) -> Result<ShowPayload, serde_json::Error> {
    let show: TmdbShow = serde_json::from_value(raw.clone())?;
    Ok(ShowPayload {
        id: show.id,
        name: show.name.unwrap_or_default(),
        first_air_date: non_empty(show.first_air_date),
        overview: non_empty(show.overview),
        status: show.status,
        poster_path: show.poster_path,
        backdrop_path: show.backdrop_path,
        imdb_id: show.external_ids.and_then(|ids| non_empty(ids.imdb_id)),
        number_of_seasons: show.number_of_seasons.unwrap_or(0),
        number_of_episodes: show.number_of_episodes.unwrap_or(0),
        raw,
    })
}

pub(crate) fn parse_season(raw: Value) -> Result<SeasonPayload, serde_json::Error> {
    let season: TmdbSeason = serde_json::from_value(raw.clone())?;
    let episodes = season
        .episodes
        .into_iter()
        .map(parse_episode)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SeasonPayload {
        id: season.id,
        season_number: season.season_number,
        name: season.name,
        air_date: non_empty(season.air_date),
        overview: non_empty(season.overview),
        poster_path: season.poster_path,
        episodes,
        raw,
    })
}

fn parse_episode(raw: Value) -> Result<EpisodePayload, serde_json::Error> {
    let episode: TmdbEpisode = serde_json::from_value(raw.clone())?;
    Ok(EpisodePayload {
        id: episode.id,
        episode_number: episode.episode_number,
        name: episode.name,
        air_date: non_empty(episode.air_date),
        overview: non_empty(episode.overview),
        still_path: episode.still_path,
        raw,
    })
}

pub(crate) fn parse_changed_page(raw: Value) -> Result<TmdbChangedPage, serde_json::Error> {
    serde_json::from_value(raw)
}

/// Map a `/changes` response onto change entries.
///
/// Identifying numbers live inside each item's `value` object, e.g.
/// `{"season_id": 3624, "season_number": 1}`.
pub(crate) fn parse_changes(raw: Value) -> Result<Vec<ChangeEntry>, serde_json::Error> {
    let changes: TmdbChanges = serde_json::from_value(raw)?;
    Ok(changes
        .changes
        .into_iter()
        .map(|change| {
            let items = change
                .items
                .into_iter()
                .map(|item| ChangeItem {
                    id: item.id,
                    action: item.action,
                    time: item.time,
                    season_id: item.value.get("season_id").and_then(Value::as_u64),
                    season_number: value_u32(&item.value, "season_number"),
                    episode_id: item.value.get("episode_id").and_then(Value::as_u64),
                    episode_number: value_u32(&item.value, "episode_number"),
                })
                .collect();
            ChangeEntry::new(ChangeKind::from_key(&change.key), items)
        })
        .collect())
}

fn value_u32(value: &Value, key: &str) -> Option<u32> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

pub(crate) fn parse_search(raw: Value) -> Result<Vec<ShowSummary>, serde_json::Error> {
    let page: TmdbSearchPage = serde_json::from_value(raw)?;
    Ok(page
        .results
        .into_iter()
        .map(|result| ShowSummary {
            id: result.id,
            name: result.name.unwrap_or_default(),
            first_air_date: non_empty(result.first_air_date),
            overview: non_empty(result.overview),
            poster_path: result.poster_path,
        })
        .collect())
}

pub(crate) fn parse_configuration(raw: Value) -> Result<ImageConfig, serde_json::Error> {
    let configuration: TmdbConfiguration = serde_json::from_value(raw)?;
    Ok(configuration.images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_show_reads_external_ids() {
        let raw = json!({
            "id": 1399,
            "name": "Game of Thrones",
            "first_air_date": "2011-04-17",
            "overview": "Seven noble families fight for control.",
            "status": "Ended",
            "poster_path": "/poster.jpg",
            "backdrop_path": null,
            "number_of_seasons": 8,
            "number_of_episodes": 73,
            "external_ids": { "imdb_id": "tt0944947", "tvdb_id": 121361 }
        });

        let show = parse_show(raw.clone()).unwrap();
        assert_eq!(show.imdb_id.as_deref(), Some("tt0944947"));
        assert_eq!(show.number_of_seasons, 8);
        assert_eq!(show.backdrop_path, None);
        assert_eq!(show.raw, raw);
    }

    #[test]
    fn test_parse_show_tolerates_missing_counts_and_empty_dates() {
        let show = parse_show(json!({ "id": 5, "name": "Pilot Only", "first_air_date": "" })).unwrap();
        assert_eq!(show.number_of_seasons, 0);
        assert_eq!(show.first_air_date, None);
        assert_eq!(show.imdb_id, None);
    }

    #[test]
    fn test_parse_season_with_episodes() {
        let raw = json!({
            "id": 3624,
            "season_number": 1,
            "name": "Season 1",
            "air_date": "2011-04-17",
            "episodes": [
                { "id": 63056, "episode_number": 1, "name": "Winter Is Coming", "still_path": "/a.jpg" },
                { "id": 63057, "episode_number": 2, "name": "The Kingsroad", "air_date": "" }
            ]
        });

        let season = parse_season(raw).unwrap();
        assert_eq!(season.id, Some(3624));
        assert_eq!(season.episodes.len(), 2);
        assert_eq!(season.episodes[1].air_date, None);
        assert_eq!(season.episodes[0].raw["name"], json!("Winter Is Coming"));
    }

    #[test]
    fn test_parse_changes_reads_item_values() {
        let raw = json!({
            "changes": [
                {
                    "key": "season",
                    "items": [{
                        "id": "5ce",
                        "action": "added",
                        "time": "2019-05-28 14:02:37 UTC",
                        "value": { "season_id": 130007, "season_number": 3 }
                    }]
                },
                {
                    "key": "name",
                    "items": [{ "id": "5cf", "action": "updated", "value": "New Name" }]
                }
            ]
        });

        let entries = parse_changes(raw).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, ChangeKind::Season);
        assert_eq!(entries[0].items[0].season_number, Some(3));
        assert_eq!(entries[0].items[0].season_id, Some(130007));
        assert_eq!(entries[1].kind, ChangeKind::Other("name".to_string()));
        assert_eq!(entries[1].items[0].season_number, None);
    }

    #[test]
    fn test_parse_configuration() {
        let raw = json!({
            "images": {
                "base_url": "http://image.tmdb.org/t/p/",
                "secure_base_url": "https://image.tmdb.org/t/p/",
                "poster_sizes": ["w92", "w154"],
                "backdrop_sizes": ["w300"],
                "still_sizes": ["w92"]
            },
            "change_keys": ["name"]
        });

        let config = parse_configuration(raw).unwrap();
        assert_eq!(config.poster_sizes, vec!["w92", "w154"]);
    }
}
