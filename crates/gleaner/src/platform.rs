//! Boundary between the harvesting engine and the code host.
//!
//! The engine only ever talks to a [`PlatformClient`]. The production
//! implementation lives in [`crate::github`]; tests substitute scripted fakes
//! that raise rate-limit and not-found errors deterministically.

mod errors;
mod rate_limit;
mod types;

pub use errors::{PlatformError, Result, short_error_message};
pub use rate_limit::{BudgetCategory, RateLimitState, RateLimits};
pub use types::{
    ContentEntry, EntryKind, InvalidRepoId, IssueState, PlatformClient, ReleaseInfo, RepoDetails,
    RepoId, SearchHit, SearchPage,
};
