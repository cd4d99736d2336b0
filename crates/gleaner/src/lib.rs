//! Gleaner - harvests metadata about GitHub repositories that use a given
//! technology.
//!
//! Candidates come from code search, split into date windows small enough
//! for the search API's 1000-result cap, or from a curated seed list. Each
//! candidate is probed for marker files, its metadata collected, and one
//! immutable record stored per repository. Every remote call goes through a
//! rate-limit guard that waits for the budget to reset instead of failing.
//!
//! # Features
//!
//! - `github` - The REST client for api.github.com.
//! - `airtable` - Export of found repositories to Airtable.
//! - `migrate` - Database migrations and [`connect_and_migrate`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gleaner::{connect_and_migrate, github::GitHubClient, harvest::*, retry::RateLimitGuard};
//!
//! let db = connect_and_migrate("sqlite://gleaner.db?mode=rwc").await?;
//! let guard = RateLimitGuard::new(Arc::new(GitHubClient::new(Some(&token))?));
//! let mut cursor = QueryPartitioner::new(&guard, SearchOptions::default()).enumerate();
//! let collector = MetadataCollector::new(&guard, CollectorConfig::default());
//! let summary = Harvester::new(collector, &db)
//!     .run_search(&mut cursor, CollectOptions::for_search(), None)
//!     .await?;
//! ```

pub mod db;
pub mod discovery;
pub mod entity;
pub mod harvest;
pub mod http;
pub mod platform;
pub mod record;
pub mod repository;
pub mod retry;

#[cfg(feature = "github")]
pub mod github;

#[cfg(feature = "airtable")]
pub mod export;

#[cfg(feature = "migrate")]
pub mod migration;

#[cfg(test)]
pub(crate) mod testing;

pub use db::{connect, sqlite_url};
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use platform::{PlatformClient, PlatformError, RateLimits, RepoId};
pub use record::{FilteredRecord, FoundRecord, MetadataRecord};
pub use repository::{IncrementalStore, StoreError};
