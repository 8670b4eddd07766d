use anyhow::Result;
use serde::Serialize;
use showtrack_models::{ChangeSet, RatingNode, SeriesChange, ShowId, ShowProjection, UserRating};
use std::sync::Arc;
use tracing::{info, warn};
use crate::reconcile::RatingReconciler;
use crate::store::ShowStore;
use crate::sync::{LoadOutcome, SyncEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    AlreadyTracked,
    NotFound,
}

/// A tracked show together with the user's rating state for it.
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistEntry {
    pub show: ShowProjection,
    pub rating: serde_json::Value,
    pub watched_episodes: usize,
}

/// User-facing watchlist operations on top of the sync engine and the
/// rating reconciler.
pub struct WatchlistService {
    engine: Arc<SyncEngine>,
    reconciler: RatingReconciler,
}

impl WatchlistService {
    pub fn new(engine: Arc<SyncEngine>, reconciler: RatingReconciler) -> Self {
        Self { engine, reconciler }
    }

    /// Load the show if needed and start tracking it
    pub async fn add(&self, user_id: &str, show_id: ShowId) -> Result<AddOutcome> {
        if let LoadOutcome::NotFound = self.engine.load_new(show_id).await? {
            return Ok(AddOutcome::NotFound);
        }

        if self.reconciler.ratings_for(user_id)?.is_tracking(show_id) {
            return Ok(AddOutcome::AlreadyTracked);
        }

        self.reconciler
            .apply_changes(user_id, &ChangeSet::from([(show_id, SeriesChange::tracking(true))]))?;
        info!(operation = "watchlist_add", user_id = user_id, show_id = show_id, "Show added to watchlist");
        Ok(AddOutcome::Added)
    }

    /// Stop tracking a show. Ratings and watched flags are kept.
    pub fn remove(&self, user_id: &str, show_id: ShowId) -> Result<UserRating> {
        self.reconciler
            .apply_changes(user_id, &ChangeSet::from([(show_id, SeriesChange::tracking(false))]))
    }

    pub fn mark_watched(
        &self,
        user_id: &str,
        show_id: ShowId,
        season: u32,
        episode: u32,
    ) -> Result<UserRating> {
        let known = self
            .engine
            .show_store()
            .get(show_id)?
            .map(|show| show.episode(season, episode).is_some())
            .unwrap_or(false);
        if !known {
            warn!(
                show_id = show_id,
                "Marking S{:02}E{:02} watched although it is not in the show store",
                season,
                episode
            );
        }

        self.reconciler.apply_changes(
            user_id,
            &ChangeSet::from([(show_id, SeriesChange::episode_watched(season, episode, true))]),
        )
    }

    /// Tracked shows that are present in the show store, in show id order
    pub fn list(&self, user_id: &str) -> Result<Vec<WatchlistEntry>> {
        let ratings = self.reconciler.ratings_for(user_id)?;
        let mut entries = Vec::new();

        for show_id in ratings.tracked_show_ids() {
            let Some(show) = self.engine.show_store().get(show_id)? else {
                warn!(show_id = show_id, "Tracked show missing from show store");
                continue;
            };
            let Some(series) = ratings.series(show_id) else {
                continue;
            };
            entries.push(WatchlistEntry {
                show: show.to_projection(),
                rating: series.to_projection(),
                watched_episodes: series.watched_episodes(),
            });
        }

        Ok(entries)
    }
}
