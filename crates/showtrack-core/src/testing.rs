//! Fixtures shared by the unit tests of this crate.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use showtrack_catalog::{CatalogClient, CatalogError};
use showtrack_models::{
    ChangeEntry, EpisodePayload, ImageConfig, SeasonPayload, ShowId, ShowPayload, ShowSummary,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn show_payload(id: ShowId, seasons: u32) -> ShowPayload {
    ShowPayload {
        id,
        name: format!("Show {}", id),
        first_air_date: Some("2011-04-17".to_string()),
        overview: Some("overview".to_string()),
        status: Some("Returning Series".to_string()),
        poster_path: Some(format!("/{}.jpg", id)),
        backdrop_path: None,
        imdb_id: Some(format!("tt{:07}", id)),
        number_of_seasons: seasons,
        number_of_episodes: seasons * 2,
        raw: json!({ "id": id }),
    }
}

pub fn season_payload(number: u32, episodes: u32, name: &str) -> SeasonPayload {
    SeasonPayload {
        id: Some(1000 + number as u64),
        season_number: number,
        name: Some(name.to_string()),
        air_date: None,
        overview: None,
        poster_path: None,
        episodes: (1..=episodes)
            .map(|n| EpisodePayload {
                id: Some(10_000 + n as u64),
                episode_number: n,
                name: Some(format!("{} E{}", name, n)),
                air_date: None,
                overview: None,
                still_path: None,
                raw: json!({ "episode_number": n }),
            })
            .collect(),
        raw: json!({ "season_number": number }),
    }
}

/// Scriptable in-memory catalog that counts the calls it receives.
#[derive(Default)]
pub struct FakeCatalog {
    pub shows: Mutex<BTreeMap<ShowId, ShowPayload>>,
    pub seasons: Mutex<BTreeMap<(ShowId, u32), SeasonPayload>>,
    /// Season fetches that fail with a transport-level error
    pub failing_seasons: Mutex<BTreeSet<(ShowId, u32)>>,
    /// Shows whose payload fetch fails
    pub failing_shows: Mutex<BTreeSet<ShowId>>,
    pub changed_ids: Mutex<BTreeSet<ShowId>>,
    pub show_changes: Mutex<BTreeMap<ShowId, Vec<ChangeEntry>>>,
    pub season_changes: Mutex<BTreeMap<u64, Vec<ChangeEntry>>>,
    pub image_config: Mutex<Option<ImageConfig>>,
    pub show_fetches: AtomicUsize,
    pub season_fetches: Mutex<Vec<(ShowId, u32)>>,
    pub feed_calls: Mutex<Vec<(ShowId, Option<NaiveDate>)>>,
    pub image_config_fetches: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a show with `seasons` seasons of two episodes each
    pub fn with_show(self, id: ShowId, seasons: u32) -> Self {
        self.shows.lock().unwrap().insert(id, show_payload(id, seasons));
        for number in 1..=seasons {
            self.seasons
                .lock()
                .unwrap()
                .insert((id, number), season_payload(number, 2, "original"));
        }
        self
    }

    pub fn set_season(&self, id: ShowId, payload: SeasonPayload) {
        self.seasons.lock().unwrap().insert((id, payload.season_number), payload);
    }

    pub fn remove_season(&self, id: ShowId, number: u32) {
        self.seasons.lock().unwrap().remove(&(id, number));
    }

    pub fn set_show(&self, payload: ShowPayload) {
        self.shows.lock().unwrap().insert(payload.id, payload);
    }

    pub fn season_fetch_count(&self) -> usize {
        self.season_fetches.lock().unwrap().len()
    }

    pub fn fetched_seasons(&self, id: ShowId) -> BTreeSet<u32> {
        self.season_fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(show, _)| *show == id)
            .map(|(_, number)| *number)
            .collect()
    }

    pub fn reset_counts(&self) {
        self.show_fetches.store(0, Ordering::SeqCst);
        self.season_fetches.lock().unwrap().clear();
        self.feed_calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn fetch_show(&self, show_id: ShowId) -> Result<Option<ShowPayload>, CatalogError> {
        self.show_fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing_shows.lock().unwrap().contains(&show_id) {
            return Err(CatalogError::RateLimited { retry_after_secs: 10 });
        }
        Ok(self.shows.lock().unwrap().get(&show_id).cloned())
    }

    async fn fetch_season(
        &self,
        show_id: ShowId,
        season_number: u32,
    ) -> Result<Option<SeasonPayload>, CatalogError> {
        self.season_fetches.lock().unwrap().push((show_id, season_number));
        if self.failing_seasons.lock().unwrap().contains(&(show_id, season_number)) {
            return Err(CatalogError::Decode("truncated body".to_string()));
        }
        Ok(self.seasons.lock().unwrap().get(&(show_id, season_number)).cloned())
    }

    async fn fetch_changed_show_ids(
        &self,
        _since: Option<NaiveDate>,
    ) -> Result<BTreeSet<ShowId>, CatalogError> {
        Ok(self.changed_ids.lock().unwrap().clone())
    }

    async fn fetch_show_changes(
        &self,
        show_id: ShowId,
        since: Option<NaiveDate>,
    ) -> Result<Vec<ChangeEntry>, CatalogError> {
        self.feed_calls.lock().unwrap().push((show_id, since));
        Ok(self.show_changes.lock().unwrap().get(&show_id).cloned().unwrap_or_default())
    }

    async fn fetch_season_changes(
        &self,
        season_id: u64,
        _since: Option<NaiveDate>,
    ) -> Result<Vec<ChangeEntry>, CatalogError> {
        Ok(self.season_changes.lock().unwrap().get(&season_id).cloned().unwrap_or_default())
    }

    async fn search_shows(&self, query: &str) -> Result<Vec<ShowSummary>, CatalogError> {
        Ok(self
            .shows
            .lock()
            .unwrap()
            .values()
            .filter(|show| show.name.to_lowercase().contains(&query.to_lowercase()))
            .map(|show| ShowSummary {
                id: show.id,
                name: show.name.clone(),
                first_air_date: show.first_air_date.clone(),
                overview: show.overview.clone(),
                poster_path: show.poster_path.clone(),
            })
            .collect())
    }

    async fn fetch_image_config(&self) -> Result<Option<ImageConfig>, CatalogError> {
        self.image_config_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.image_config.lock().unwrap().clone())
    }
}
