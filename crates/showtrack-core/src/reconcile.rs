use anyhow::Result;
use chrono::Utc;
use showtrack_models::{ChangeSet, RatingNode, UserRating};
use std::sync::Arc;
use tracing::{debug, info};
use crate::rating_store::RatingStore;

/// Merges client change-sets into a user's rating document.
#[derive(Clone)]
pub struct RatingReconciler {
    store: Arc<dyn RatingStore>,
}

impl RatingReconciler {
    pub fn new(store: Arc<dyn RatingStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RatingStore> {
        &self.store
    }

    /// Current rating document of a user (empty when none was saved yet)
    pub fn ratings_for(&self, user_id: &str) -> Result<UserRating> {
        Ok(self
            .store
            .get(user_id)?
            .unwrap_or_else(|| UserRating::new(user_id)))
    }

    /// Apply a change-set as a field-level patch and persist the result once.
    ///
    /// Only fields present in the change-set are written. Series, season and
    /// episode nodes named by the change-set are created on first touch.
    pub fn apply_changes(&self, user_id: &str, changes: &ChangeSet) -> Result<UserRating> {
        let mut ratings = self.ratings_for(user_id)?;
        let now = Utc::now();

        for (show_id, change) in changes {
            let series = ratings.series_or_insert(*show_id, now);

            if let Some(rating) = change.rating {
                series.rate(rating);
            }
            if let Some(tracking) = change.tracking {
                series.tracking = tracking;
            }

            let mut nested_rating = false;
            for (season_number, season_change) in change.seasons.iter().flatten() {
                let season = series.season_mut(*season_number);
                if let Some(rating) = season_change.rating {
                    season.rate(rating);
                    nested_rating = true;
                }

                for (episode_number, episode_change) in season_change.episodes.iter().flatten() {
                    let episode = season.episode_mut(*episode_number);
                    if let Some(rating) = episode_change.rating {
                        episode.rate(rating);
                        nested_rating = true;
                    }
                    if let Some(watched) = episode_change.watched {
                        episode.watched = watched;
                    }
                }
            }
            if nested_rating {
                series.last_rated = Some(now);
            }

            debug!(user_id = user_id, show_id = *show_id, "Applied rating changes");
        }

        self.store.put(&ratings)?;
        info!(
            operation = "apply_changes",
            user_id = user_id,
            shows = changes.len(),
            "Saved rating changes"
        );
        Ok(ratings)
    }
}
