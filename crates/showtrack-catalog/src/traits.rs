use async_trait::async_trait;
use chrono::NaiveDate;
use showtrack_models::{ChangeEntry, ImageConfig, SeasonPayload, ShowId, ShowPayload, ShowSummary};
use std::collections::BTreeSet;
use crate::error::CatalogError;

/// Read access to a TV metadata catalog.
///
/// Implementations handle the provider's rate limiting themselves. Anything
/// the provider answers with a non-success status other than 429 comes back
/// as `None` / empty.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn fetch_show(&self, show_id: ShowId) -> Result<Option<ShowPayload>, CatalogError>;

    /// Season document with its episodes embedded
    async fn fetch_season(
        &self,
        show_id: ShowId,
        season_number: u32,
    ) -> Result<Option<SeasonPayload>, CatalogError>;

    /// Ids of every show changed since `since` (provider default window when
    /// `None`). All result pages are drained before returning.
    async fn fetch_changed_show_ids(
        &self,
        since: Option<NaiveDate>,
    ) -> Result<BTreeSet<ShowId>, CatalogError>;

    async fn fetch_show_changes(
        &self,
        show_id: ShowId,
        since: Option<NaiveDate>,
    ) -> Result<Vec<ChangeEntry>, CatalogError>;

    /// Episode-level change feed of one season, addressed by catalog season id
    async fn fetch_season_changes(
        &self,
        season_id: u64,
        since: Option<NaiveDate>,
    ) -> Result<Vec<ChangeEntry>, CatalogError>;

    async fn search_shows(&self, query: &str) -> Result<Vec<ShowSummary>, CatalogError>;

    async fn fetch_image_config(&self) -> Result<Option<ImageConfig>, CatalogError>;
}
