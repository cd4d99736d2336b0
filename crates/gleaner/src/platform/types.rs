use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::errors::Result;
use super::rate_limit::RateLimits;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Owner + name pair that identifies a repository on the code host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

/// Returned when a string has fewer than two usable path segments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot derive owner/name from {input:?}")]
pub struct InvalidRepoId {
    pub input: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/name` or any URL, keeping its last two path segments.
    ///
    /// ```ignore
    /// let id = RepoId::parse("https://github.com/nf-core/rnaseq").unwrap();
    /// assert_eq!(id.full_name(), "nf-core/rnaseq");
    /// ```
    pub fn parse(input: &str) -> std::result::Result<Self, InvalidRepoId> {
        let trimmed = input.trim();
        let invalid = || InvalidRepoId {
            input: input.to_string(),
        };

        let segments: Vec<String> = match url::Url::parse(trimmed) {
            Ok(url) if url.has_host() => url
                .path_segments()
                .map(|segments| {
                    segments
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            _ => trimmed
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        };

        let [owner, name] = match segments.as_slice() {
            [.., owner, name] => [owner.as_str(), name.as_str()],
            _ => return Err(invalid()),
        };
        let name = name.strip_suffix(".git").unwrap_or(name);
        if owner.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(owner, name))
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Store key. The code host treats names case-insensitively, so the key
    /// is the lowercased full name.
    pub fn key(&self) -> String {
        self.full_name().to_lowercase()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = InvalidRepoId;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ─── Responses ───────────────────────────────────────────────────────────────

/// Repository fields read from the single-repository endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoDetails {
    pub id: RepoId,
    pub html_url: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub language: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub stars: u64,
    pub watchers: u64,
    pub forks: u64,
    pub archived: bool,
    /// Full name of the repository this one was forked from.
    pub parent: Option<String>,
}

/// Kind of a directory listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
}

impl ContentEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// A single search result entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub repo: RepoId,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of repository search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Total matches reported by the host for the whole query.
    pub total_count: u64,
    /// Set when the host gave up before finding every match.
    pub incomplete_results: bool,
    pub items: Vec<SearchHit>,
}

/// Newest release of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub name: Option<String>,
    pub tag_name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// State filter for issue and pull request counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

// ─── Client Trait ────────────────────────────────────────────────────────────

/// Remote calls the harvesting engine needs from the code host.
///
/// Every method may fail with [`PlatformError::RateLimited`] and
/// [`PlatformError::NotFound`]; callers route them through the
/// [`RateLimitGuard`](crate::retry::RateLimitGuard) so the former never
/// escapes.
///
/// [`PlatformError::RateLimited`]: super::PlatformError::RateLimited
/// [`PlatformError::NotFound`]: super::PlatformError::NotFound
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Current budgets for every category. Does not consume budget.
    async fn rate_limits(&self) -> Result<RateLimits>;

    /// Full-text repository search, most recently updated first.
    async fn search_repositories(&self, query: &str, page: u32, per_page: u32)
    -> Result<SearchPage>;

    async fn get_repo(&self, repo: &RepoId) -> Result<RepoDetails>;

    /// List a directory. An empty `path` lists the root.
    async fn list_dir(&self, repo: &RepoId, path: &str) -> Result<Vec<ContentEntry>>;

    /// Raw bytes of a file.
    async fn get_file(&self, repo: &RepoId, path: &str) -> Result<Vec<u8>>;

    async fn list_topics(&self, repo: &RepoId) -> Result<Vec<String>>;

    /// Bytes of code per language, largest first.
    async fn list_languages(&self, repo: &RepoId) -> Result<Vec<(String, u64)>>;

    /// Commit timestamp of the head of the default branch. `None` for an
    /// empty repository.
    async fn latest_commit_date(&self, repo: &RepoId) -> Result<Option<DateTime<Utc>>>;

    async fn count_releases(&self, repo: &RepoId) -> Result<u64>;

    async fn latest_release(&self, repo: &RepoId) -> Result<Option<ReleaseInfo>>;

    async fn count_issues(&self, repo: &RepoId, state: IssueState) -> Result<u64>;

    async fn count_pulls(&self, repo: &RepoId, state: IssueState) -> Result<u64>;

    async fn count_contributors(&self, repo: &RepoId) -> Result<u64>;
}
