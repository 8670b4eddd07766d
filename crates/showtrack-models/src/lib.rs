pub mod change_set;
pub mod changes;
pub mod payload;
pub mod rating;
pub mod show;

/// Catalog identifier of a TV show.
pub type ShowId = u64;

/// Identifier of an authenticated user (provider account id).
pub type UserId = String;

pub use change_set::{ChangeSet, EpisodeChange, SeasonChange, SeriesChange};
pub use changes::{ChangeEntry, ChangeItem, ChangeKind};
pub use payload::{EpisodePayload, ImageConfig, SeasonPayload, ShowPayload, ShowSummary};
pub use rating::{EpisodeRating, RatingNode, SeasonRating, SeriesRating, UserRating};
pub use show::{Episode, EpisodeProjection, Season, SeasonProjection, Show, ShowProjection};
