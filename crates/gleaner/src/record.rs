//! Outcome of collecting one repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::entity::filter_reason::FilterReason;
use crate::platform::{ReleaseInfo, RepoId};

/// What the file-tree probe saw in the root and one level down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Marker files in the root. At most one, the scan stops at the first.
    pub root_matches: Vec<String>,
    /// Marker files in first-level directories, at most one per directory.
    pub nested_matches: Vec<String>,
    /// Well-known file names present in the root.
    #[serde(default)]
    pub well_known_root: Vec<String>,
    /// Well-known file names present in first-level directories (as paths).
    #[serde(default)]
    pub well_known_nested: Vec<String>,
    /// Content markers found inside matched files.
    #[serde(default)]
    pub content_markers: Vec<String>,
    /// Matched files whose content could not be decoded as text.
    #[serde(default)]
    pub undecodable: Vec<String>,
}

impl ProbeResult {
    pub fn any_match(&self) -> bool {
        !self.root_matches.is_empty() || !self.nested_matches.is_empty()
    }

    pub fn has_well_known_root(&self, name: &str) -> bool {
        self.well_known_root.iter().any(|n| n == name)
    }

    pub fn has_well_known_nested(&self, name: &str) -> bool {
        self.well_known_nested
            .iter()
            .any(|path| path.rsplit('/').next() == Some(name))
    }
}

/// Open/closed split of issues or pull requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub open: u64,
    pub closed: u64,
}

impl StateCounts {
    pub fn total(&self) -> u64 {
        self.open + self.closed
    }
}

/// Share of one language in the repository's code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub language: String,
    pub bytes: u64,
    /// Percentage of all bytes, rounded to two decimals.
    pub percent: f64,
}

impl LanguageShare {
    /// Turn raw byte counts into shares, keeping the input order.
    pub fn from_bytes(languages: &[(String, u64)]) -> Vec<LanguageShare> {
        let total: u64 = languages.iter().map(|(_, bytes)| bytes).sum();
        languages
            .iter()
            .map(|(language, bytes)| {
                let percent = if total == 0 {
                    0.0
                } else {
                    (*bytes as f64 / total as f64 * 10_000.0).round() / 100.0
                };
                LanguageShare {
                    language: language.clone(),
                    bytes: *bytes,
                    percent,
                }
            })
            .collect()
    }
}

/// README located in the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadmeInfo {
    pub file_name: String,
    /// `None` when the file could not be decoded as text.
    pub mentions_keyword: Option<bool>,
}

/// Full metadata of a relevant repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundRecord {
    pub id: RepoId,
    pub url: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub topics: Vec<String>,

    pub stars: u64,
    pub watchers: u64,
    pub forks: u64,
    pub issues: StateCounts,
    pub pulls: StateCounts,
    pub releases: u64,
    pub contributors: u64,

    pub last_commit_at: Option<DateTime<Utc>>,
    /// Set only when `releases > 0`.
    pub latest_release: Option<ReleaseInfo>,
    /// Full name of the repository this one was forked from.
    pub parent: Option<String>,

    pub primary_language: Option<String>,
    pub languages: Vec<LanguageShare>,
    /// Bytes written in the target language.
    pub target_language_bytes: u64,
    /// Whether the primary language is the target language.
    pub is_target_language: bool,

    pub probe: ProbeResult,
    pub readme: Option<ReadmeInfo>,
}

impl FoundRecord {
    pub fn title(&self) -> &str {
        &self.id.name
    }

    pub fn owner(&self) -> &str {
        &self.id.owner
    }

    /// `title--owner`, unique across owners.
    pub fn display_name(&self) -> String {
        format!("{}--{}", self.id.name, self.id.owner)
    }
}

/// A repository that was looked at and deliberately not harvested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredRecord {
    pub id: RepoId,
    pub exists: bool,
    pub reason: FilterReason,
}

impl FilteredRecord {
    pub fn new(id: RepoId, reason: FilterReason) -> Self {
        Self {
            id,
            exists: reason != FilterReason::DoesNotExist,
            reason,
        }
    }
}

/// Terminal outcome of collecting one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MetadataRecord {
    Found(Box<FoundRecord>),
    Filtered(FilteredRecord),
}

impl MetadataRecord {
    pub fn id(&self) -> &RepoId {
        match self {
            MetadataRecord::Found(found) => &found.id,
            MetadataRecord::Filtered(filtered) => &filtered.id,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, MetadataRecord::Found(_))
    }

    pub fn filter_reason(&self) -> Option<FilterReason> {
        match self {
            MetadataRecord::Found(_) => None,
            MetadataRecord::Filtered(filtered) => Some(filtered.reason),
        }
    }
}
