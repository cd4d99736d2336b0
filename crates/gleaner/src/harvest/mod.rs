//! The harvesting engine.
//!
//! A [`QueryPartitioner`] turns a search predicate into a [`SearchCursor`]
//! over every matching repository. A [`Harvester`] feeds those identifiers
//! (or a fixed list) through the [`IncrementalStore`] check and the
//! [`MetadataCollector`], writing one record per new identifier. All remote
//! calls go through the [`RateLimitGuard`].
//!
//! ```ignore
//! use gleaner::harvest::{CollectOptions, Harvester, MetadataCollector, QueryPartitioner};
//!
//! let guard = RateLimitGuard::new(client);
//! let collector = MetadataCollector::new(&guard, CollectorConfig::default());
//! let harvester = Harvester::new(collector, &db);
//! let mut cursor = QueryPartitioner::new(&guard, SearchOptions::default()).enumerate();
//! let summary = harvester
//!     .run_search(&mut cursor, CollectOptions::for_search(), None)
//!     .await?;
//! ```
//!
//! [`IncrementalStore`]: crate::repository::IncrementalStore
//! [`RateLimitGuard`]: crate::retry::RateLimitGuard

mod collect;
mod driver;
mod errors;
mod partition;
mod probe;
mod progress;
mod types;
mod window;

pub use collect::MetadataCollector;
pub use driver::{Harvester, Outcome};
pub use errors::{CollectError, HarvestError};
pub use partition::{CursorStats, QueryPartitioner, SearchCursor};
pub use probe::FileTreeProber;
pub use progress::{HarvestProgress, ProgressCallback, emit};
pub use types::{
    CollectOptions, CollectorConfig, DEFAULT_BASE_QUERY, DEFAULT_EXCLUDED, DEFAULT_FIRST_YEAR,
    DEFAULT_KEYWORD, DEFAULT_MARKER_SUFFIX, DEFAULT_TARGET_LANGUAGE, DEFAULT_WELL_KNOWN_FILES,
    ExclusionList, HarvestSummary, MarkerPredicate, ProbeConfig, SEARCH_PAGE_SIZE,
    SEARCH_RESULT_CAP, SearchOptions,
};
pub use window::{Granularity, SearchWindow};
