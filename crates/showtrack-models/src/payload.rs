use serde::{Deserialize, Serialize};
use crate::ShowId;

/// Show-level document as delivered by the catalog provider.
///
/// The typed fields are the ones the sync engine reads; `raw` keeps the full
/// provider response so nothing the provider sends is lost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShowPayload {
    pub id: ShowId,
    pub name: String,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub imdb_id: Option<String>,
    pub number_of_seasons: u32,
    pub number_of_episodes: u32,
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// Season document with its episodes embedded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonPayload {
    pub id: Option<u64>,
    pub season_number: u32,
    pub name: Option<String>,
    pub air_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub episodes: Vec<EpisodePayload>,
    #[serde(default)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodePayload {
    pub id: Option<u64>,
    pub episode_number: u32,
    pub name: Option<String>,
    pub air_date: Option<String>,
    pub overview: Option<String>,
    pub still_path: Option<String>,
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// One hit of a catalog search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShowSummary {
    pub id: ShowId,
    pub name: String,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
}

/// Image configuration of the catalog provider (where posters live and in
/// which sizes they can be requested).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageConfig {
    pub base_url: String,
    pub secure_base_url: String,
    #[serde(default)]
    pub poster_sizes: Vec<String>,
    #[serde(default)]
    pub backdrop_sizes: Vec<String>,
    #[serde(default)]
    pub still_sizes: Vec<String>,
}

impl ImageConfig {
    /// Build a poster URL for the given size index (0 = smallest).
    ///
    /// Returns None when the provider does not offer that many sizes.
    pub fn poster_url(&self, size_index: usize, path: &str) -> Option<String> {
        Self::join(&self.secure_base_url, self.poster_sizes.get(size_index)?, path)
    }

    pub fn backdrop_url(&self, size_index: usize, path: &str) -> Option<String> {
        Self::join(&self.secure_base_url, self.backdrop_sizes.get(size_index)?, path)
    }

    pub fn still_url(&self, size_index: usize, path: &str) -> Option<String> {
        Self::join(&self.secure_base_url, self.still_sizes.get(size_index)?, path)
    }

    fn join(base: &str, size: &str, path: &str) -> Option<String> {
        if path.is_empty() {
            return None;
        }
        Some(format!("{}{}{}", base, size, path))
    }
}
