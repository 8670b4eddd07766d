use thiserror::Error;

/// Failures talking to the catalog provider.
///
/// A resource the provider does not have is not an error; lookups return
/// `None` or an empty collection for that.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("rate limited by catalog provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not decode catalog response: {0}")]
    Decode(String),
}
