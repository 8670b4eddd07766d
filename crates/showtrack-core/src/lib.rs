pub mod images;
pub mod rating_store;
pub mod reconcile;
pub mod stats;
pub mod store;
pub mod sync;
pub mod watchlist;

#[cfg(test)]
pub(crate) mod testing;

pub use images::ImageConfigCache;
pub use rating_store::{FileRatingStore, MemoryRatingStore, RatingStore};
pub use reconcile::RatingReconciler;
pub use stats::{CounterStore, FileCounterStore, MemoryCounterStore, LAST_NIGHTLY_SYNC_SHOW_UPDATE_COUNT};
pub use store::{FileShowStore, MemoryShowStore, ShowStore};
pub use sync::{LoadOutcome, NightlySyncReport, SyncEngine, SyncOptions, UpdateOutcome};
pub use watchlist::{AddOutcome, WatchlistEntry, WatchlistService};
