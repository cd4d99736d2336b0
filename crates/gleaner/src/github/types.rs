//! GitHub REST API wire types.
//!
//! Only the fields the harvester reads are declared; serde ignores the rest.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::{
    ContentEntry, EntryKind, RateLimitState, RateLimits, ReleaseInfo, RepoDetails, RepoId,
    SearchHit, SearchPage,
};

/// A single rate limit resource entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResource {
    /// Maximum requests allowed per period.
    pub limit: u64,
    /// Requests used in current period.
    pub used: u64,
    /// Remaining requests in current period.
    pub remaining: u64,
    /// Unix timestamp when the rate limit resets.
    pub reset: i64,
}

impl RateLimitResource {
    /// Get the reset time as a DateTime.
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.reset, 0).unwrap_or_else(Utc::now)
    }

    pub fn to_state(&self) -> RateLimitState {
        RateLimitState {
            limit: self.limit,
            used: self.used,
            remaining: self.remaining,
            reset_at: self.reset_at(),
        }
    }
}

/// The resources the harvester spends budget on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRateLimits {
    /// Core API rate limit (non-search REST endpoints).
    pub core: RateLimitResource,
    /// Search API rate limit.
    pub search: RateLimitResource,
}

/// Response of `GET /rate_limit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRateLimitResponse {
    pub resources: GitHubRateLimits,
}

impl From<GitHubRateLimitResponse> for RateLimits {
    fn from(response: GitHubRateLimitResponse) -> Self {
        RateLimits {
            core: response.resources.core.to_state(),
            search: response.resources.search.to_state(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubParent {
    pub full_name: String,
}

/// Response of `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub owner: GitHubOwner,
    pub html_url: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub language: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub archived: bool,
    pub parent: Option<GitHubParent>,
}

impl From<GitHubRepo> for RepoDetails {
    fn from(repo: GitHubRepo) -> Self {
        RepoDetails {
            id: RepoId::new(repo.owner.login, repo.name),
            html_url: repo.html_url,
            // GitHub sends "" for a cleared homepage.
            homepage: repo.homepage.filter(|h| !h.is_empty()),
            description: repo.description,
            language: repo.language,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            stars: repo.stargazers_count,
            watchers: repo.watchers_count,
            forks: repo.forks_count,
            archived: repo.archived,
            parent: repo.parent.map(|p| p.full_name),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubSearchItem {
    pub name: String,
    pub owner: GitHubOwner,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Response of `GET /search/repositories`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubSearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<GitHubSearchItem>,
}

impl From<GitHubSearchResponse> for SearchPage {
    fn from(response: GitHubSearchResponse) -> Self {
        SearchPage {
            total_count: response.total_count,
            incomplete_results: response.incomplete_results,
            items: response
                .items
                .into_iter()
                .map(|item| SearchHit {
                    repo: RepoId::new(item.owner.login, item.name),
                    updated_at: item.updated_at,
                })
                .collect(),
        }
    }
}

/// One element of a directory listing from `GET /repos/{o}/{r}/contents/{path}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubContentItem {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<GitHubContentItem> for ContentEntry {
    fn from(item: GitHubContentItem) -> Self {
        let kind = match item.kind.as_str() {
            "dir" => EntryKind::Dir,
            "symlink" => EntryKind::Symlink,
            "submodule" => EntryKind::Submodule,
            _ => EntryKind::File,
        };
        ContentEntry {
            name: item.name,
            path: item.path,
            kind,
        }
    }
}

/// A single file from the contents endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubFileContent {
    pub content: Option<String>,
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubTopics {
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    pub name: Option<String>,
    pub tag_name: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<GitHubRelease> for ReleaseInfo {
    fn from(release: GitHubRelease) -> Self {
        ReleaseInfo {
            name: release.name.filter(|n| !n.is_empty()),
            tag_name: release.tag_name,
            created_at: release.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubSignature {
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommitDetail {
    pub committer: Option<GitHubSignature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommit {
    pub commit: GitHubCommitDetail,
}

impl GitHubCommit {
    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.commit.committer.as_ref().and_then(|c| c.date)
    }
}

/// Language byte counts, largest first, ties by name.
pub fn sort_languages(languages: HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut languages: Vec<(String, u64)> = languages.into_iter().collect();
    languages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    languages
}
