use crate::error::CatalogError;
use crate::tmdb::api;
use crate::traits::CatalogClient;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use showtrack_config::CatalogConfig;
use showtrack_models::{ChangeEntry, ImageConfig, SeasonPayload, ShowId, ShowPayload, ShowSummary};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

// TMDB never serves more than 500 pages of a listing
const MAX_CHANGE_PAGES: u32 = 500;

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    language: String,
    base_url: String,
    default_retry_after_secs: u64,
}

impl TmdbClient {
    pub fn new(api_key: String, language: String) -> Result<Self, CatalogError> {
        let config = CatalogConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            language,
            ..CatalogConfig::default()
        };
        Self::from_config(api_key, &config)
    }

    pub fn from_config(api_key: String, config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            language: config.language.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_retry_after_secs: config.default_retry_after_secs,
        })
    }

    /// Point the client at another server (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_retry_after(mut self, secs: u64) -> Self {
        self.default_retry_after_secs = secs;
        self
    }

    fn retry_after_secs(&self, response: &Response) -> u64 {
        response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(self.default_retry_after_secs)
    }

    /// GET a TMDB endpoint and return the decoded JSON body.
    ///
    /// A 429 is retried once after the provider's cooldown; a second 429 is
    /// an error. Any other non-success status yields `Ok(None)`.
    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Value>, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        let mut retried = false;

        loop {
            let response = self
                .client
                .get(&url)
                .header("Accept", "application/json")
                .query(&[("api_key", self.api_key.as_str()), ("language", self.language.as_str())])
                .query(params)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = self.retry_after_secs(&response);
                if retried {
                    warn!(path = %path, wait_secs = wait, "TMDB still rate limiting after retry");
                    return Err(CatalogError::RateLimited { retry_after_secs: wait });
                }
                retried = true;
                warn!(path = %path, wait_secs = wait, "TMDB returned 429, backing off");
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            if !status.is_success() {
                error!(path = %path, status = %status, "TMDB request failed");
                return Ok(None);
            }

            let body = response.text().await?;
            let value = serde_json::from_str(&body)
                .map_err(|e| CatalogError::Decode(format!("{}: {}", path, e)))?;
            return Ok(Some(value));
        }
    }

    fn since_param(since: Option<NaiveDate>) -> Vec<(&'static str, String)> {
        since
            .map(|date| vec![("start_date", date.format("%Y-%m-%d").to_string())])
            .unwrap_or_default()
    }
}

fn decode_error(path: &str, e: serde_json::Error) -> CatalogError {
    CatalogError::Decode(format!("{}: {}", path, e))
}

#[async_trait]
impl CatalogClient for TmdbClient {
    fn provider_name(&self) -> &str {
        "tmdb"
    }

    async fn fetch_show(&self, show_id: ShowId) -> Result<Option<ShowPayload>, CatalogError> {
        let path = format!("/tv/{}", show_id);
        let params = [("append_to_response", "external_ids".to_string())];
        match self.get_json(&path, &params).await? {
            Some(raw) => api::parse_show(raw).map(Some).map_err(|e| decode_error(&path, e)),
            None => Ok(None),
        }
    }

    async fn fetch_season(
        &self,
        show_id: ShowId,
        season_number: u32,
    ) -> Result<Option<SeasonPayload>, CatalogError> {
        let path = format!("/tv/{}/season/{}", show_id, season_number);
        match self.get_json(&path, &[]).await? {
            Some(raw) => api::parse_season(raw).map(Some).map_err(|e| decode_error(&path, e)),
            None => Ok(None),
        }
    }

    async fn fetch_changed_show_ids(
        &self,
        since: Option<NaiveDate>,
    ) -> Result<BTreeSet<ShowId>, CatalogError> {
        let path = "/tv/changes";
        let mut ids = BTreeSet::new();
        let mut page = 1u32;

        loop {
            let mut params = Self::since_param(since);
            params.push(("page", page.to_string()));

            let Some(raw) = self.get_json(path, &params).await? else {
                warn!(
                    operation = "fetch_changed_show_ids",
                    page = page,
                    collected = ids.len(),
                    "Changed shows feed stopped early, returning a truncated set"
                );
                break;
            };
            let listing = api::parse_changed_page(raw).map_err(|e| decode_error(path, e))?;
            let total_pages = listing.total_pages.unwrap_or(1).min(MAX_CHANGE_PAGES);

            debug!(
                page = listing.page.unwrap_or(page),
                total_pages = total_pages,
                items_on_page = listing.results.len(),
                "TMDB changed shows page"
            );
            ids.extend(listing.results.into_iter().map(|changed| changed.id));

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        info!(operation = "fetch_changed_show_ids", count = ids.len(), "Fetched changed show ids");
        Ok(ids)
    }

    async fn fetch_show_changes(
        &self,
        show_id: ShowId,
        since: Option<NaiveDate>,
    ) -> Result<Vec<ChangeEntry>, CatalogError> {
        let path = format!("/tv/{}/changes", show_id);
        match self.get_json(&path, &Self::since_param(since)).await? {
            Some(raw) => api::parse_changes(raw).map_err(|e| decode_error(&path, e)),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_season_changes(
        &self,
        season_id: u64,
        since: Option<NaiveDate>,
    ) -> Result<Vec<ChangeEntry>, CatalogError> {
        let path = format!("/tv/season/{}/changes", season_id);
        match self.get_json(&path, &Self::since_param(since)).await? {
            Some(raw) => api::parse_changes(raw).map_err(|e| decode_error(&path, e)),
            None => Ok(Vec::new()),
        }
    }

    async fn search_shows(&self, query: &str) -> Result<Vec<ShowSummary>, CatalogError> {
        let path = "/search/tv";
        let params = [("query", query.to_string())];
        match self.get_json(path, &params).await? {
            Some(raw) => api::parse_search(raw).map_err(|e| decode_error(path, e)),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_image_config(&self) -> Result<Option<ImageConfig>, CatalogError> {
        let path = "/configuration";
        match self.get_json(path, &[]).await? {
            Some(raw) => api::parse_configuration(raw).map(Some).map_err(|e| decode_error(path, e)),
            None => Ok(None),
        }
    }
}
