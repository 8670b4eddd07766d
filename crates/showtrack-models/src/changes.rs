use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What kind of sub-document a change feed entry refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Season,
    Episode,
    /// Show-level field changes (name, overview, images, ...)
    Other(String),
}

impl ChangeKind {
    /// Map a provider change key onto a kind
    pub fn from_key(key: &str) -> Self {
        match key {
            "season" => ChangeKind::Season,
            "episode" => ChangeKind::Episode,
            other => ChangeKind::Other(other.to_string()),
        }
    }

    /// True for kinds that point into the season map
    pub fn touches_seasons(&self) -> bool {
        matches!(self, ChangeKind::Season | ChangeKind::Episode)
    }
}

/// One entry of a change feed: a kind plus the changed items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub kind: ChangeKind,
    #[serde(default)]
    pub items: Vec<ChangeItem>,
}

/// A single change, carrying whatever identifying numbers the provider sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeItem {
    pub id: Option<String>,
    pub action: Option<String>,
    pub time: Option<String>,
    pub season_id: Option<u64>,
    pub season_number: Option<u32>,
    pub episode_id: Option<u64>,
    pub episode_number: Option<u32>,
}

impl ChangeEntry {
    pub fn new(kind: ChangeKind, items: Vec<ChangeItem>) -> Self {
        Self { kind, items }
    }

    /// Convenience constructor for a season-kind entry naming season numbers
    pub fn seasons(numbers: &[u32]) -> Self {
        Self::new(
            ChangeKind::Season,
            numbers
                .iter()
                .map(|n| ChangeItem {
                    season_number: Some(*n),
                    ..ChangeItem::default()
                })
                .collect(),
        )
    }
}

/// Season numbers named by season- or episode-kind entries
pub fn changed_season_numbers(entries: &[ChangeEntry]) -> BTreeSet<u32> {
    entries
        .iter()
        .filter(|entry| entry.kind.touches_seasons())
        .flat_map(|entry| entry.items.iter())
        .filter_map(|item| item.season_number)
        .collect()
}

/// Catalog season ids of items that carry an id but no season number
pub fn changed_season_ids_without_number(entries: &[ChangeEntry]) -> BTreeSet<u64> {
    entries
        .iter()
        .filter(|entry| entry.kind.touches_seasons())
        .flat_map(|entry| entry.items.iter())
        .filter(|item| item.season_number.is_none())
        .filter_map(|item| item.season_id)
        .collect()
}
