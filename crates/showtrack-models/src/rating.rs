use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use crate::{ShowId, UserId};

// These documents are persisted with bincode, so no field may use
// `skip_serializing_if`.

/// Capability shared by the three levels of rating nodes.
pub trait RatingNode {
    /// Set the numeric rating (0 means unset)
    fn rate(&mut self, value: u8);

    fn rating(&self) -> u8;

    /// JSON shape handed to the presentation layer
    fn to_projection(&self) -> serde_json::Value;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRating {
    pub rating: u8,
    pub watched: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonRating {
    pub rating: u8,
    pub episodes: BTreeMap<u32, EpisodeRating>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRating {
    pub rating: u8,
    /// On the watchlist. Untracking keeps the rest of the history.
    pub tracking: bool,
    pub last_rated: Option<DateTime<Utc>>,
    pub added: DateTime<Utc>,
    pub seasons: BTreeMap<u32, SeasonRating>,
}

/// All rating state of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRating {
    pub user_id: UserId,
    pub series: BTreeMap<ShowId, SeriesRating>,
}

impl RatingNode for EpisodeRating {
    fn rate(&mut self, value: u8) {
        self.rating = value;
    }

    fn rating(&self) -> u8 {
        self.rating
    }

    fn to_projection(&self) -> serde_json::Value {
        json!({
            "rating": self.rating,
            "watched": self.watched,
        })
    }
}

impl SeasonRating {
    /// True iff at least one episode is recorded and all recorded episodes
    /// are watched
    pub fn fully_watched(&self) -> bool {
        !self.episodes.is_empty() && self.episodes.values().all(|episode| episode.watched)
    }

    pub fn episode_mut(&mut self, number: u32) -> &mut EpisodeRating {
        self.episodes.entry(number).or_default()
    }

    pub fn watched_count(&self) -> usize {
        self.episodes.values().filter(|episode| episode.watched).count()
    }
}

impl RatingNode for SeasonRating {
    fn rate(&mut self, value: u8) {
        self.rating = value;
    }

    fn rating(&self) -> u8 {
        self.rating
    }

    fn to_projection(&self) -> serde_json::Value {
        let episodes: serde_json::Map<String, serde_json::Value> = self
            .episodes
            .iter()
            .map(|(number, episode)| (number.to_string(), episode.to_projection()))
            .collect();

        json!({
            "rating": self.rating,
            "fully_watched": self.fully_watched(),
            "episodes": episodes,
        })
    }
}

impl SeriesRating {
    pub fn new(added: DateTime<Utc>) -> Self {
        Self {
            rating: 0,
            tracking: false,
            last_rated: None,
            added,
            seasons: BTreeMap::new(),
        }
    }

    pub fn season_mut(&mut self, number: u32) -> &mut SeasonRating {
        self.seasons.entry(number).or_default()
    }

    pub fn watched_episodes(&self) -> usize {
        self.seasons.values().map(SeasonRating::watched_count).sum()
    }

    /// Whether a specific episode is marked watched
    pub fn is_watched(&self, season: u32, episode: u32) -> bool {
        self.seasons
            .get(&season)
            .and_then(|s| s.episodes.get(&episode))
            .map(|e| e.watched)
            .unwrap_or(false)
    }
}

impl RatingNode for SeriesRating {
    fn rate(&mut self, value: u8) {
        self.rating = value;
        self.last_rated = Some(Utc::now());
    }

    fn rating(&self) -> u8 {
        self.rating
    }

    fn to_projection(&self) -> serde_json::Value {
        let seasons: serde_json::Map<String, serde_json::Value> = self
            .seasons
            .iter()
            .map(|(number, season)| (number.to_string(), season.to_projection()))
            .collect();

        json!({
            "rating": self.rating,
            "tracking": self.tracking,
            "last_rated": self.last_rated,
            "added": self.added,
            "seasons": seasons,
        })
    }
}

impl UserRating {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            series: BTreeMap::new(),
        }
    }

    pub fn series(&self, show_id: ShowId) -> Option<&SeriesRating> {
        self.series.get(&show_id)
    }

    /// Get the series rating for a show, creating it (stamped `added = now`)
    /// on first touch
    pub fn series_or_insert(&mut self, show_id: ShowId, now: DateTime<Utc>) -> &mut SeriesRating {
        self.series
            .entry(show_id)
            .or_insert_with(|| SeriesRating::new(now))
    }

    pub fn is_tracking(&self, show_id: ShowId) -> bool {
        self.series(show_id).map(|s| s.tracking).unwrap_or(false)
    }

    pub fn tracked_show_ids(&self) -> Vec<ShowId> {
        self.series
            .iter()
            .filter(|(_, series)| series.tracking)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Show-id-keyed JSON with nested season/episode state
    pub fn to_projection(&self) -> serde_json::Value {
        let series: serde_json::Map<String, serde_json::Value> = self
            .series
            .iter()
            .map(|(id, rating)| (id.to_string(), rating.to_projection()))
            .collect();
        serde_json::Value::Object(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watched(flag: bool) -> EpisodeRating {
        EpisodeRating { rating: 0, watched: flag }
    }

    #[test]
    fn test_fully_watched_empty_season() {
        assert!(!SeasonRating::default().fully_watched());
    }

    #[test]
    fn test_fully_watched_all_episodes() {
        let mut season = SeasonRating::default();
        season.episodes.insert(1, watched(true));
        season.episodes.insert(2, watched(true));
        assert!(season.fully_watched());
    }

    #[test]
    fn test_fully_watched_one_unwatched() {
        let mut season = SeasonRating::default();
        season.episodes.insert(1, watched(true));
        season.episodes.insert(2, watched(false));
        assert!(!season.fully_watched());
    }

    #[test]
    fn test_series_rate_stamps_last_rated() {
        let mut series = SeriesRating::new(Utc::now());
        assert!(series.last_rated.is_none());
        series.rate(8);
        assert_eq!(series.rating(), 8);
        assert!(series.last_rated.is_some());
    }

    #[test]
    fn test_series_or_insert_is_lazy() {
        let mut ratings = UserRating::new("user-1");
        let added = Utc::now();
        ratings.series_or_insert(42, added).tracking = true;
        // second touch must not reset the node
        let series = ratings.series_or_insert(42, Utc::now());
        assert!(series.tracking);
        assert_eq!(series.added, added);
        assert_eq!(ratings.tracked_show_ids(), vec![42]);
    }

    #[test]
    fn test_projection_shape() {
        let mut ratings = UserRating::new("user-1");
        let series = ratings.series_or_insert(1399, Utc::now());
        series.tracking = true;
        series.season_mut(1).episode_mut(3).watched = true;

        let projection = ratings.to_projection();
        let season = &projection["1399"]["seasons"]["1"];
        assert_eq!(projection["1399"]["tracking"], json!(true));
        assert_eq!(season["fully_watched"], json!(true));
        assert_eq!(season["episodes"]["3"]["watched"], json!(true));
    }
}
