use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use showtrack_catalog::CatalogClient;
use showtrack_config::SyncConfig;
use showtrack_models::changes::{changed_season_ids_without_number, changed_season_numbers};
use showtrack_models::{Season, Show, ShowId};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use crate::stats::{CounterStore, LAST_NIGHTLY_SYNC_SHOW_UPDATE_COUNT};
use crate::store::ShowStore;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub season_fetch_concurrency: usize,
    pub change_window_days: i64,
    pub deep_episode_check: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            season_fetch_concurrency: config.season_fetch_concurrency.max(1),
            change_window_days: config.change_window_days,
            deep_episode_check: config.deep_episode_check,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded {
        seasons_loaded: Vec<u32>,
        /// Declared seasons the catalog did not deliver
        seasons_missing: Vec<u32>,
    },
    AlreadyPresent,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Updated { refreshed_seasons: Vec<u32> },
    /// The show is not in the local store
    NotTracked,
    /// The catalog no longer knows the show; the cached copy is kept
    NotFound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NightlySyncReport {
    pub changed_in_feed: usize,
    pub matched_local: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Keeps the show store in step with the catalog.
///
/// Every operation writes a show document at most once, after all of its
/// catalog fetches have completed.
pub struct SyncEngine {
    catalog: Arc<dyn CatalogClient>,
    shows: Arc<dyn ShowStore>,
    counters: Arc<dyn CounterStore>,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        shows: Arc<dyn ShowStore>,
        counters: Arc<dyn CounterStore>,
        options: SyncOptions,
    ) -> Self {
        Self {
            catalog,
            shows,
            counters,
            options,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogClient> {
        &self.catalog
    }

    pub fn show_store(&self) -> &Arc<dyn ShowStore> {
        &self.shows
    }

    /// Load a show that is not cached yet, with every season the catalog
    /// can deliver.
    #[instrument(skip(self), fields(operation = "load_new"))]
    pub async fn load_new(&self, show_id: ShowId) -> Result<LoadOutcome> {
        if self.shows.contains(show_id)? {
            debug!("Show {} already in store, skipping load", show_id);
            return Ok(LoadOutcome::AlreadyPresent);
        }

        let payload = self
            .catalog
            .fetch_show(show_id)
            .await
            .with_context(|| format!("Failed to fetch show {} from {}", show_id, self.catalog.provider_name()))?;
        let Some(payload) = payload else {
            info!("Show {} not found in catalog", show_id);
            return Ok(LoadOutcome::NotFound);
        };

        let mut show = Show::from_payload(payload, Utc::now());
        let numbers: Vec<u32> = (1..=show.number_of_seasons).collect();

        let mut seasons_loaded = Vec::new();
        for season in self.fetch_seasons(show_id, &numbers).await {
            let number = season.number;
            if show.insert_season(season) {
                seasons_loaded.push(number);
            }
        }
        seasons_loaded.sort_unstable();
        let seasons_missing = show.missing_seasons();

        self.shows.upsert(&show)?;

        info!(
            operation = "load_new",
            show_id = show_id,
            seasons_loaded = seasons_loaded.len(),
            seasons_missing = seasons_missing.len(),
            "Loaded show {}",
            show.name
        );
        Ok(LoadOutcome::Loaded {
            seasons_loaded,
            seasons_missing,
        })
    }

    /// Refresh a cached show, refetching only the seasons its change feed
    /// names.
    ///
    /// Show-level fields are always refreshed. Cached seasons that are not
    /// flagged stay as they are, even when the catalog now declares fewer
    /// seasons.
    #[instrument(skip(self), fields(operation = "incremental_update"))]
    pub async fn incremental_update(&self, show_id: ShowId) -> Result<UpdateOutcome> {
        let Some(mut show) = self.shows.get(show_id)? else {
            debug!("Show {} is not tracked locally", show_id);
            return Ok(UpdateOutcome::NotTracked);
        };

        let now = Utc::now();
        let flagged = self.flagged_seasons(&show, now).await?;

        let payload = self
            .catalog
            .fetch_show(show_id)
            .await
            .with_context(|| format!("Failed to refetch show {}", show_id))?;
        let Some(payload) = payload else {
            warn!("Show {} is no longer available from the catalog, keeping cached copy", show_id);
            return Ok(UpdateOutcome::NotFound);
        };
        show.refresh_from(payload, now);

        // None means every declared season, counted after the refresh so new
        // seasons are included
        let numbers: Vec<u32> = match flagged {
            Some(flagged) => flagged.into_iter().filter(|n| show.declares_season(*n)).collect(),
            None => (1..=show.number_of_seasons).collect(),
        };

        let mut refreshed_seasons = Vec::new();
        for season in self.fetch_seasons(show_id, &numbers).await {
            let number = season.number;
            if show.insert_season(season) {
                refreshed_seasons.push(number);
            }
        }
        refreshed_seasons.sort_unstable();

        self.shows.upsert(&show)?;

        info!(
            operation = "incremental_update",
            show_id = show_id,
            flagged = numbers.len(),
            refreshed = refreshed_seasons.len(),
            "Updated show {}",
            show.name
        );
        Ok(UpdateOutcome::Updated { refreshed_seasons })
    }

    /// Refresh every locally known show that the catalog reports as changed
    /// in the last day.
    ///
    /// Shows that are not cached are never loaded. A failing show is logged
    /// and counted; the run continues.
    #[instrument(skip(self), fields(operation = "bulk_nightly_sync"))]
    pub async fn bulk_nightly_sync(&self) -> Result<NightlySyncReport> {
        let start = Instant::now();

        let changed = self
            .catalog
            .fetch_changed_show_ids(None)
            .await
            .context("Failed to fetch changed show ids")?;
        let local: BTreeSet<ShowId> = self.shows.list_ids()?.into_iter().collect();
        let matched: Vec<ShowId> = changed.intersection(&local).copied().collect();

        info!(
            operation = "nightly_sync_start",
            changed_in_feed = changed.len(),
            local_shows = local.len(),
            matched_local = matched.len(),
            "Starting nightly sync"
        );

        let mut report = NightlySyncReport {
            changed_in_feed: changed.len(),
            matched_local: matched.len(),
            ..NightlySyncReport::default()
        };

        for show_id in matched {
            match self.incremental_update(show_id).await {
                Ok(UpdateOutcome::Updated { .. }) => report.updated += 1,
                Ok(outcome) => debug!(show_id = show_id, ?outcome, "Show not updated"),
                Err(e) => {
                    report.failed += 1;
                    warn!(show_id = show_id, "Nightly update of show {} failed: {:#}", show_id, e);
                }
            }
        }

        self.counters
            .set(LAST_NIGHTLY_SYNC_SHOW_UPDATE_COUNT, report.updated as u64)?;

        info!(
            operation = "nightly_sync_complete",
            updated = report.updated,
            failed = report.failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Nightly sync complete"
        );
        Ok(report)
    }

    /// Season numbers to refetch, or None when the change feed cannot cover
    /// the time since the last sync
    async fn flagged_seasons(&self, show: &Show, now: DateTime<Utc>) -> Result<Option<BTreeSet<u32>>> {
        let age = now - show.last_synced;
        if age > Duration::days(self.options.change_window_days) {
            info!(
                show_id = show.id,
                days_since_sync = age.num_days(),
                "Last sync is older than the change window, refreshing every season"
            );
            return Ok(None);
        }

        let since = show.last_synced.date_naive();
        let entries = self
            .catalog
            .fetch_show_changes(show.id, Some(since))
            .await
            .with_context(|| format!("Failed to fetch change feed of show {}", show.id))?;

        let mut flagged = changed_season_numbers(&entries);
        for season_id in changed_season_ids_without_number(&entries) {
            if let Some(number) = show.season_number_for_catalog_id(season_id) {
                flagged.insert(number);
            }
        }

        if self.options.deep_episode_check {
            for season in show.seasons.values() {
                if flagged.contains(&season.number) {
                    continue;
                }
                let Some(season_id) = season.catalog_id else {
                    continue;
                };
                match self.catalog.fetch_season_changes(season_id, Some(since)).await {
                    Ok(entries) if !entries.is_empty() => {
                        debug!(show_id = show.id, season = season.number, "Episode changes found");
                        flagged.insert(season.number);
                    }
                    Ok(_) => {}
                    Err(e) => warn!(
                        show_id = show.id,
                        season = season.number,
                        "Failed to fetch episode changes: {}",
                        e
                    ),
                }
            }
        }

        debug!(show_id = show.id, flagged = ?flagged, "Seasons flagged by change feed");
        Ok(Some(flagged))
    }

    /// Fetch seasons concurrently; absent or failed seasons are left out
    async fn fetch_seasons(&self, show_id: ShowId, numbers: &[u32]) -> Vec<Season> {
        stream::iter(numbers.iter().copied())
            .map(|number| async move {
                match self.catalog.fetch_season(show_id, number).await {
                    Ok(Some(payload)) => {
                        let mut season = Season::from_payload(payload);
                        season.number = number;
                        Some(season)
                    }
                    Ok(None) => {
                        warn!("Season {} of show {} not available from catalog", number, show_id);
                        None
                    }
                    Err(e) => {
                        warn!("Failed to fetch season {} of show {}: {}", number, show_id, e);
                        None
                    }
                }
            })
            .buffer_unordered(self.options.season_fetch_concurrency.max(1))
            .filter_map(|season| async move { season })
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::MemoryCounterStore;
    use crate::store::MemoryShowStore;
    use crate::testing::{season_payload, show_payload, FakeCatalog};
    use showtrack_models::{ChangeEntry, ChangeItem, ChangeKind};
    use std::sync::atomic::Ordering;

    struct Harness {
        catalog: Arc<FakeCatalog>,
        shows: Arc<MemoryShowStore>,
        counters: Arc<MemoryCounterStore>,
        engine: SyncEngine,
    }

    fn harness_with(catalog: FakeCatalog, options: SyncOptions) -> Harness {
        let catalog = Arc::new(catalog);
        let shows = Arc::new(MemoryShowStore::new());
        let counters = Arc::new(MemoryCounterStore::new());
        let engine = SyncEngine::new(catalog.clone(), shows.clone(), counters.clone(), options);
        Harness {
            catalog,
            shows,
            counters,
            engine,
        }
    }

    fn harness(catalog: FakeCatalog) -> Harness {
        harness_with(catalog, SyncOptions::default())
    }

    fn season_name(shows: &MemoryShowStore, id: ShowId, number: u32) -> Option<String> {
        shows.get(id).unwrap().unwrap().seasons.get(&number)?.name.clone()
    }

    #[tokio::test]
    async fn test_load_new_is_idempotent() {
        let h = harness(FakeCatalog::new().with_show(1, 3));

        let first = h.engine.load_new(1).await.unwrap();
        assert_eq!(
            first,
            LoadOutcome::Loaded {
                seasons_loaded: vec![1, 2, 3],
                seasons_missing: vec![],
            }
        );

        let second = h.engine.load_new(1).await.unwrap();
        assert_eq!(second, LoadOutcome::AlreadyPresent);
        assert_eq!(h.catalog.show_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(h.catalog.season_fetch_count(), 3);
        assert_eq!(h.shows.list_ids().unwrap(), vec![1]);

        let show = h.shows.get(1).unwrap().unwrap();
        assert_eq!(show.seasons[&2].episodes.len(), 2);
        assert_eq!(show.imdb_id.as_deref(), Some("tt0000001"));
    }

    #[tokio::test]
    async fn test_load_new_unknown_show() {
        let h = harness(FakeCatalog::new());
        assert_eq!(h.engine.load_new(99).await.unwrap(), LoadOutcome::NotFound);
        assert!(h.shows.list_ids().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_new_skips_missing_season() {
        let catalog = FakeCatalog::new().with_show(1, 3);
        catalog.remove_season(1, 2);
        let h = harness(catalog);

        let outcome = h.engine.load_new(1).await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                seasons_loaded: vec![1, 3],
                seasons_missing: vec![2],
            }
        );
        let show = h.shows.get(1).unwrap().unwrap();
        assert_eq!(show.seasons.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_load_new_skips_failed_season() {
        let catalog = FakeCatalog::new().with_show(1, 2);
        catalog.failing_seasons.lock().unwrap().insert((1, 1));
        let h = harness(catalog);

        let outcome = h.engine.load_new(1).await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                seasons_loaded: vec![2],
                seasons_missing: vec![1],
            }
        );
    }

    #[tokio::test]
    async fn test_load_new_fails_when_show_fetch_fails() {
        let catalog = FakeCatalog::new().with_show(1, 2);
        catalog.failing_shows.lock().unwrap().insert(1);
        let h = harness(catalog);

        assert!(h.engine.load_new(1).await.is_err());
        assert!(h.shows.list_ids().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_new_with_single_fetch_slot() {
        let options = SyncOptions {
            season_fetch_concurrency: 1,
            ..SyncOptions::default()
        };
        let h = harness_with(FakeCatalog::new().with_show(1, 5), options);
        let outcome = h.engine.load_new(1).await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Loaded { ref seasons_loaded, .. } if seasons_loaded.len() == 5));
    }

    #[tokio::test]
    async fn test_update_refetches_only_flagged_seasons() {
        let h = harness(FakeCatalog::new().with_show(1, 3));
        h.engine.load_new(1).await.unwrap();
        h.catalog.reset_counts();

        h.catalog.set_season(1, season_payload(1, 2, "updated"));
        h.catalog.set_season(1, season_payload(2, 2, "updated"));
        h.catalog
            .show_changes
            .lock()
            .unwrap()
            .insert(1, vec![ChangeEntry::seasons(&[2])]);

        let outcome = h.engine.incremental_update(1).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated { refreshed_seasons: vec![2] });
        assert_eq!(h.catalog.fetched_seasons(1), BTreeSet::from([2]));
        assert_eq!(season_name(&h.shows, 1, 1).as_deref(), Some("original"));
        assert_eq!(season_name(&h.shows, 1, 2).as_deref(), Some("updated"));
        assert_eq!(season_name(&h.shows, 1, 3).as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn test_flagged_season_is_replaced_wholesale() {
        let h = harness(FakeCatalog::new().with_show(1, 2));
        h.engine.load_new(1).await.unwrap();

        h.catalog.set_season(1, season_payload(2, 1, "trimmed"));
        h.catalog.show_changes.lock().unwrap().insert(
            1,
            vec![ChangeEntry::new(
                ChangeKind::Episode,
                vec![ChangeItem {
                    season_number: Some(2),
                    episode_number: Some(2),
                    ..ChangeItem::default()
                }],
            )],
        );

        h.engine.incremental_update(1).await.unwrap();
        let show = h.shows.get(1).unwrap().unwrap();
        assert_eq!(show.seasons[&2].episodes.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(show.seasons[&2].episode_count, 1);
    }

    #[tokio::test]
    async fn test_update_maps_season_ids_to_numbers() {
        let h = harness(FakeCatalog::new().with_show(1, 3));
        h.engine.load_new(1).await.unwrap();
        h.catalog.reset_counts();

        // season_payload assigns catalog id 1000 + number
        h.catalog.show_changes.lock().unwrap().insert(
            1,
            vec![ChangeEntry::new(
                ChangeKind::Season,
                vec![ChangeItem {
                    season_id: Some(1003),
                    ..ChangeItem::default()
                }],
            )],
        );

        let outcome = h.engine.incremental_update(1).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated { refreshed_seasons: vec![3] });
    }

    #[tokio::test]
    async fn test_flagged_season_absent_keeps_cached_copy() {
        let h = harness(FakeCatalog::new().with_show(1, 2));
        h.engine.load_new(1).await.unwrap();

        h.catalog.remove_season(1, 2);
        h.catalog
            .show_changes
            .lock()
            .unwrap()
            .insert(1, vec![ChangeEntry::seasons(&[2])]);

        let outcome = h.engine.incremental_update(1).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated { refreshed_seasons: vec![] });
        assert_eq!(season_name(&h.shows, 1, 2).as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn test_flagged_season_fetch_error_keeps_cached_copy() {
        let h = harness(FakeCatalog::new().with_show(1, 2));
        h.engine.load_new(1).await.unwrap();

        h.catalog.set_season(1, season_payload(1, 2, "refreshed"));
        h.catalog.failing_seasons.lock().unwrap().insert((1, 2));
        h.catalog
            .show_changes
            .lock()
            .unwrap()
            .insert(1, vec![ChangeEntry::seasons(&[1, 2])]);

        let outcome = h.engine.incremental_update(1).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated { refreshed_seasons: vec![1] });
        assert_eq!(season_name(&h.shows, 1, 1).as_deref(), Some("refreshed"));
        assert_eq!(season_name(&h.shows, 1, 2).as_deref(), Some("original"));
        assert_eq!(h.shows.get(1).unwrap().unwrap().seasons[&2].episodes.len(), 2);
    }

    #[tokio::test]
    async fn test_load_new_keeps_continued_episode_numbers() {
        let catalog = FakeCatalog::new().with_show(1, 2);
        let mut continued = season_payload(2, 3, "continued");
        for (episode, number) in continued.episodes.iter_mut().zip(11..) {
            episode.episode_number = number;
        }
        catalog.set_season(1, continued);
        let h = harness(catalog);

        h.engine.load_new(1).await.unwrap();
        let show = h.shows.get(1).unwrap().unwrap();
        assert_eq!(
            show.seasons[&2].episodes.keys().copied().collect::<Vec<_>>(),
            vec![11, 12, 13]
        );
        assert!(show.episode(2, 12).is_some());
    }

    #[tokio::test]
    async fn test_update_refreshes_show_fields() {
        let h = harness(FakeCatalog::new().with_show(1, 1));
        h.engine.load_new(1).await.unwrap();

        let mut payload = show_payload(1, 1);
        payload.name = "Renamed".to_string();
        payload.status = Some("Ended".to_string());
        h.catalog.set_show(payload);

        h.engine.incremental_update(1).await.unwrap();
        let show = h.shows.get(1).unwrap().unwrap();
        assert_eq!(show.name, "Renamed");
        assert_eq!(show.status.as_deref(), Some("Ended"));
        assert_eq!(season_name(&h.shows, 1, 1).as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn test_update_untracked_show() {
        let h = harness(FakeCatalog::new().with_show(1, 1));
        assert_eq!(h.engine.incremental_update(1).await.unwrap(), UpdateOutcome::NotTracked);
        assert_eq!(h.catalog.show_fetches.load(Ordering::SeqCst), 0);
        assert!(h.shows.list_ids().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_show_gone_from_catalog() {
        let h = harness(FakeCatalog::new().with_show(1, 1));
        h.engine.load_new(1).await.unwrap();
        h.catalog.shows.lock().unwrap().clear();

        assert_eq!(h.engine.incremental_update(1).await.unwrap(), UpdateOutcome::NotFound);
        assert!(h.shows.get(1).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_queries_feed_since_last_sync() {
        let h = harness(FakeCatalog::new().with_show(1, 1));
        h.engine.load_new(1).await.unwrap();
        let last_synced = h.shows.get(1).unwrap().unwrap().last_synced;

        h.engine.incremental_update(1).await.unwrap();
        let calls = h.catalog.feed_calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(1, Some(last_synced.date_naive()))]);
    }

    #[tokio::test]
    async fn test_stale_show_refreshes_every_season() {
        let h = harness(FakeCatalog::new().with_show(1, 3));
        h.engine.load_new(1).await.unwrap();

        let mut show = h.shows.get(1).unwrap().unwrap();
        show.last_synced = Utc::now() - Duration::days(30);
        h.shows.upsert(&show).unwrap();
        h.catalog.reset_counts();

        let outcome = h.engine.incremental_update(1).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated { refreshed_seasons: vec![1, 2, 3] });
        assert!(h.catalog.feed_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_picks_up_new_season() {
        let h = harness(FakeCatalog::new().with_show(1, 2));
        h.engine.load_new(1).await.unwrap();

        h.catalog.set_show(show_payload(1, 3));
        h.catalog.set_season(1, season_payload(3, 4, "new"));
        h.catalog
            .show_changes
            .lock()
            .unwrap()
            .insert(1, vec![ChangeEntry::seasons(&[3])]);

        let outcome = h.engine.incremental_update(1).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated { refreshed_seasons: vec![3] });
        let show = h.shows.get(1).unwrap().unwrap();
        assert_eq!(show.number_of_seasons, 3);
        assert_eq!(show.seasons[&3].episodes.len(), 4);
    }

    #[tokio::test]
    async fn test_shrunken_season_count_keeps_cached_seasons() {
        let h = harness(FakeCatalog::new().with_show(1, 3));
        h.engine.load_new(1).await.unwrap();

        h.catalog.set_show(show_payload(1, 2));
        h.engine.incremental_update(1).await.unwrap();

        let show = h.shows.get(1).unwrap().unwrap();
        assert_eq!(show.number_of_seasons, 2);
        assert!(show.seasons.contains_key(&3));
    }

    #[tokio::test]
    async fn test_deep_episode_check_flags_season() {
        let options = SyncOptions {
            deep_episode_check: true,
            ..SyncOptions::default()
        };
        let h = harness_with(FakeCatalog::new().with_show(1, 2), options);
        h.engine.load_new(1).await.unwrap();

        h.catalog.season_changes.lock().unwrap().insert(
            1001,
            vec![ChangeEntry::new(
                ChangeKind::Episode,
                vec![ChangeItem {
                    episode_id: Some(10_002),
                    ..ChangeItem::default()
                }],
            )],
        );

        let outcome = h.engine.incremental_update(1).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated { refreshed_seasons: vec![1] });
    }

    #[tokio::test]
    async fn test_nightly_sync_only_touches_local_shows() {
        let catalog = FakeCatalog::new().with_show(10, 1).with_show(20, 1).with_show(30, 1);
        *catalog.changed_ids.lock().unwrap() = BTreeSet::from([10, 20, 30]);
        let h = harness(catalog);
        h.engine.load_new(10).await.unwrap();
        h.engine.load_new(30).await.unwrap();

        let report = h.engine.bulk_nightly_sync().await.unwrap();
        assert_eq!(
            report,
            NightlySyncReport {
                changed_in_feed: 3,
                matched_local: 2,
                updated: 2,
                failed: 0,
            }
        );
        assert_eq!(h.shows.list_ids().unwrap(), vec![10, 30]);
        assert_eq!(
            h.counters.get(LAST_NIGHTLY_SYNC_SHOW_UPDATE_COUNT).unwrap(),
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_nightly_sync_continues_after_failure() {
        let catalog = FakeCatalog::new().with_show(10, 1).with_show(30, 1);
        *catalog.changed_ids.lock().unwrap() = BTreeSet::from([10, 30]);
        let h = harness(catalog);
        h.engine.load_new(10).await.unwrap();
        h.engine.load_new(30).await.unwrap();
        h.catalog.failing_shows.lock().unwrap().insert(10);

        let report = h.engine.bulk_nightly_sync().await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(
            h.counters.get(LAST_NIGHTLY_SYNC_SHOW_UPDATE_COUNT).unwrap(),
            Some(1)
        );
    }
}
