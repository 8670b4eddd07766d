use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::ShowId;

/// Client-submitted partial update of a user's ratings, keyed by show id.
///
/// Every field is optional. A missing field and an explicit `null` both mean
/// "leave as is"; they are never coerced to a default.
pub type ChangeSet = BTreeMap<ShowId, SeriesChange>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesChange {
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub tracking: Option<bool>,
    #[serde(default)]
    pub seasons: Option<BTreeMap<u32, SeasonChange>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonChange {
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub episodes: Option<BTreeMap<u32, EpisodeChange>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeChange {
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub watched: Option<bool>,
}

impl SeriesChange {
    pub fn tracking(tracking: bool) -> Self {
        Self {
            tracking: Some(tracking),
            ..Self::default()
        }
    }

    /// Change touching a single episode's watched flag
    pub fn episode_watched(season: u32, episode: u32, watched: bool) -> Self {
        let episodes = BTreeMap::from([(
            episode,
            EpisodeChange {
                rating: None,
                watched: Some(watched),
            },
        )]);
        let seasons = BTreeMap::from([(
            season,
            SeasonChange {
                rating: None,
                episodes: Some(episodes),
            },
        )]);
        Self {
            seasons: Some(seasons),
            ..Self::default()
        }
    }
}
