use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::payload::{EpisodePayload, SeasonPayload, ShowPayload};
use crate::ShowId;

/// Denormalized show document: show-level metadata plus every season and
/// episode that has been fetched so far.
///
/// Season keys are always within `1..=number_of_seasons` when inserted through
/// [`Show::insert_season`]; holes mean the season was never fetched (or its
/// fetch failed).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Show {
    pub id: ShowId,
    pub name: String,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub imdb_id: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub status: Option<String>,
    pub number_of_seasons: u32,
    pub number_of_episodes: u32,
    #[serde(default)]
    pub payload: serde_json::Value,
    /// When the sync engine last wrote this document
    pub last_synced: DateTime<Utc>,
    #[serde(default)]
    pub seasons: BTreeMap<u32, Season>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Season {
    pub number: u32,
    pub catalog_id: Option<u64>,
    pub name: Option<String>,
    pub air_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub episode_count: u32,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub episodes: BTreeMap<u32, Episode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub number: u32,
    pub catalog_id: Option<u64>,
    pub name: Option<String>,
    pub air_date: Option<String>,
    pub overview: Option<String>,
    pub still_path: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Show {
    /// Create a show document with no seasons yet
    pub fn from_payload(payload: ShowPayload, synced_at: DateTime<Utc>) -> Self {
        let mut show = Self {
            id: payload.id,
            name: String::new(),
            first_air_date: None,
            overview: None,
            imdb_id: None,
            poster_path: None,
            backdrop_path: None,
            status: None,
            number_of_seasons: 0,
            number_of_episodes: 0,
            payload: serde_json::Value::Null,
            last_synced: synced_at,
            seasons: BTreeMap::new(),
        };
        show.refresh_from(payload, synced_at);
        show
    }

    /// Overwrite every show-level field from a fresh payload.
    ///
    /// The season map is left untouched: seasons are refreshed individually.
    pub fn refresh_from(&mut self, payload: ShowPayload, synced_at: DateTime<Utc>) {
        self.name = payload.name;
        self.first_air_date = payload.first_air_date;
        self.overview = payload.overview;
        self.imdb_id = payload.imdb_id;
        self.poster_path = payload.poster_path;
        self.backdrop_path = payload.backdrop_path;
        self.status = payload.status;
        self.number_of_seasons = payload.number_of_seasons;
        self.number_of_episodes = payload.number_of_episodes;
        self.payload = payload.raw;
        self.last_synced = synced_at;
    }

    /// Insert (or replace) a season.
    ///
    /// Returns false and drops the season when its number is outside
    /// `1..=number_of_seasons`.
    pub fn insert_season(&mut self, season: Season) -> bool {
        if !self.declares_season(season.number) {
            return false;
        }
        self.seasons.insert(season.number, season);
        true
    }

    pub fn declares_season(&self, number: u32) -> bool {
        number >= 1 && number <= self.number_of_seasons
    }

    /// Declared season numbers that have no cached sub-document
    pub fn missing_seasons(&self) -> Vec<u32> {
        (1..=self.number_of_seasons)
            .filter(|n| !self.seasons.contains_key(n))
            .collect()
    }

    /// Find the season number of a cached season by its catalog id
    pub fn season_number_for_catalog_id(&self, catalog_id: u64) -> Option<u32> {
        self.seasons
            .values()
            .find(|season| season.catalog_id == Some(catalog_id))
            .map(|season| season.number)
    }

    pub fn episode(&self, season: u32, episode: u32) -> Option<&Episode> {
        self.seasons.get(&season)?.episodes.get(&episode)
    }

    /// Read-only tree exposed to the presentation layer
    pub fn to_projection(&self) -> ShowProjection {
        ShowProjection {
            id: self.id,
            name: self.name.clone(),
            air_date: self.first_air_date.clone(),
            overview: self.overview.clone(),
            status: self.status.clone(),
            imdb_id: self.imdb_id.clone(),
            poster_path: self.poster_path.clone(),
            backdrop_path: self.backdrop_path.clone(),
            number_of_seasons: self.number_of_seasons,
            number_of_episodes: self.number_of_episodes,
            seasons: self.seasons.values().map(Season::to_projection).collect(),
        }
    }
}

impl Season {
    /// Build a season from its payload, keeping every listed episode under
    /// its own number.
    ///
    /// Providers may skip numbers or continue the numbering of the previous
    /// season, so the episode count covers the highest listed number.
    pub fn from_payload(payload: SeasonPayload) -> Self {
        let highest = payload
            .episodes
            .iter()
            .map(|episode| episode.episode_number)
            .max()
            .unwrap_or(0);
        let episode_count = highest.max(payload.episodes.len() as u32);
        let episodes = payload
            .episodes
            .into_iter()
            .map(|episode| (episode.episode_number, Episode::from_payload(episode)))
            .collect();

        Self {
            number: payload.season_number,
            catalog_id: payload.id,
            name: payload.name,
            air_date: payload.air_date,
            overview: payload.overview,
            poster_path: payload.poster_path,
            episode_count,
            payload: payload.raw,
            episodes,
        }
    }

    pub fn to_projection(&self) -> SeasonProjection {
        SeasonProjection {
            number: self.number,
            name: self.name.clone(),
            air_date: self.air_date.clone(),
            poster_path: self.poster_path.clone(),
            episode_count: self.episode_count,
            episodes: self.episodes.values().map(Episode::to_projection).collect(),
        }
    }
}

impl Episode {
    pub fn from_payload(payload: EpisodePayload) -> Self {
        Self {
            number: payload.episode_number,
            catalog_id: payload.id,
            name: payload.name,
            air_date: payload.air_date,
            overview: payload.overview,
            still_path: payload.still_path,
            payload: payload.raw,
        }
    }

    pub fn to_projection(&self) -> EpisodeProjection {
        EpisodeProjection {
            number: self.number,
            name: self.name.clone(),
            air_date: self.air_date.clone(),
            overview: self.overview.clone(),
            still_path: self.still_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShowProjection {
    pub id: ShowId,
    pub name: String,
    pub air_date: Option<String>,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub imdb_id: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub number_of_seasons: u32,
    pub number_of_episodes: u32,
    pub seasons: Vec<SeasonProjection>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeasonProjection {
    pub number: u32,
    pub name: Option<String>,
    pub air_date: Option<String>,
    pub poster_path: Option<String>,
    pub episode_count: u32,
    pub episodes: Vec<EpisodeProjection>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EpisodeProjection {
    pub number: u32,
    pub name: Option<String>,
    pub air_date: Option<String>,
    pub overview: Option<String>,
    pub still_path: Option<String>,
}
