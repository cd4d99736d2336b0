//! Progress events emitted while harvesting.
//!
//! The library never prints. Frontends pass a [`ProgressCallback`] and render
//! the events however they like (spinner, log lines, nothing).

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::platform::{BudgetCategory, RepoId};
use crate::record::FilterReason;

use super::types::HarvestSummary;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum HarvestProgress {
    /// A search window's total was read.
    WindowCounted {
        /// Window label, e.g. `2021` or `2021-03`.
        window: String,
        total: u64,
        /// Whether the window will be split instead of paginated.
        subdivided: bool,
    },

    /// Fetched a page of search results.
    FetchedPage {
        window: String,
        page: u32,
        count: usize,
        /// Results fetched so far in this window.
        total_so_far: u64,
    },

    /// A search result was dropped by the exclusion list.
    Excluded { repo: RepoId },

    /// A call hit the rate limit; the run is paused.
    RateLimited {
        category: BudgetCategory,
        reset_at: DateTime<Utc>,
        wait: Duration,
        attempt: u32,
    },

    /// Starting on one identifier.
    Collecting { repo: RepoId, index: usize },

    /// Identifier already recorded, nothing fetched.
    Skipped { repo: RepoId },

    /// A `Found` record was written.
    Found { repo: RepoId },

    /// A `Filtered` record was written.
    Filtered { repo: RepoId, reason: FilterReason },

    /// Collection failed, nothing was written for this identifier.
    Failed { repo: RepoId, error: String },

    /// Enumeration stopped on an error.
    SearchFailed { error: String },

    /// The run finished (or was interrupted).
    Complete { summary: HarvestSummary },
}

/// Callback invoked for each progress event.
pub type ProgressCallback = Box<dyn Fn(HarvestProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: HarvestProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
