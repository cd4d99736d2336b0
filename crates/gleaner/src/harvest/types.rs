//! Options, constants and the run summary of the harvesting engine.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::platform::RepoId;

/// Default search predicate: repositories mentioning the workflow language
/// in their README, excluding archived ones.
pub const DEFAULT_BASE_QUERY: &str = "nextflow in:readme archived:false";

/// First year searched. Nothing relevant predates it.
pub const DEFAULT_FIRST_YEAR: i32 = 2015;

/// The host returns at most this many results for any single search.
pub const SEARCH_RESULT_CAP: u64 = 1000;

/// Largest page size the search endpoint accepts.
pub const SEARCH_PAGE_SIZE: u32 = 100;

/// Owners and repositories never yielded by a search.
pub const DEFAULT_EXCLUDED: &[&str] = &[
    "nextflow-io",
    "nf-core/modules",
    "nf-core/tools",
    "nf-core/configs",
];

/// File suffix that marks a repository as relevant.
pub const DEFAULT_MARKER_SUFFIX: &str = ".nf";

/// Files whose presence is recorded next to the marker matches.
pub const DEFAULT_WELL_KNOWN_FILES: &[&str] = &["main.nf", "nextflow.config", "nextflow_schema.json"];

/// Word looked up (case-insensitively) in READMEs.
pub const DEFAULT_KEYWORD: &str = "nextflow";

/// Language name as reported by the host's language statistics.
pub const DEFAULT_TARGET_LANGUAGE: &str = "Nextflow";

// ─── Search ──────────────────────────────────────────────────────────────────

/// Owners and `owner/name` pairs dropped from search results.
///
/// Entries are compared case-insensitively. An entry without a slash matches
/// an owner, an entry with a slash matches a full name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    entries: HashSet<String>,
}

impl ExclusionList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_excluded(&self, repo: &RepoId) -> bool {
        self.entries.contains(&repo.owner.to_lowercase()) || self.entries.contains(&repo.key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How the search space is enumerated.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub base_query: String,
    pub first_year: i32,
    /// Last year searched. `None` means the current year.
    pub last_year: Option<i32>,
    pub cap: u64,
    pub per_page: u32,
    pub exclude: ExclusionList,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            base_query: DEFAULT_BASE_QUERY.to_string(),
            first_year: DEFAULT_FIRST_YEAR,
            last_year: None,
            cap: SEARCH_RESULT_CAP,
            per_page: SEARCH_PAGE_SIZE,
            exclude: ExclusionList::new(DEFAULT_EXCLUDED),
        }
    }
}

// ─── Probe ───────────────────────────────────────────────────────────────────

/// Decides whether a file name is a marker file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPredicate {
    pub suffixes: Vec<String>,
    /// Exact file names that also count as markers.
    pub names: Vec<String>,
}

impl MarkerPredicate {
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffixes: vec![suffix.into()],
            names: Vec::new(),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.suffixes.iter().any(|s| file_name.ends_with(s.as_str()))
            || self.names.iter().any(|n| n == file_name)
    }
}

impl Default for MarkerPredicate {
    fn default() -> Self {
        Self::suffix(DEFAULT_MARKER_SUFFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub marker: MarkerPredicate,
    pub well_known: Vec<String>,
    /// Literal substrings searched in matched files. Empty disables content
    /// checks, and with them every file download during the probe.
    pub content_markers: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            marker: MarkerPredicate::default(),
            well_known: DEFAULT_WELL_KNOWN_FILES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            content_markers: Vec::new(),
        }
    }
}

// ─── Collection ──────────────────────────────────────────────────────────────

/// Per-call switches of [`MetadataCollector::collect`](super::MetadataCollector::collect).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    pub save_readme: bool,
    pub require_marker_files: bool,
}

impl CollectOptions {
    /// Search results are only relevant when they contain marker files.
    pub fn for_search() -> Self {
        Self {
            save_readme: true,
            require_marker_files: true,
        }
    }

    /// Curated seed lists are trusted as relevant.
    pub fn for_seed_list() -> Self {
        Self {
            save_readme: true,
            require_marker_files: false,
        }
    }
}

/// Settings of the collector that stay fixed for a whole run.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub probe: ProbeConfig,
    pub keyword: String,
    pub target_language: String,
    /// Where READMEs are written, one directory per repository.
    pub readme_dir: Option<PathBuf>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            probe: ProbeConfig::default(),
            keyword: DEFAULT_KEYWORD.to_string(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            readme_dir: None,
        }
    }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Counts of one harvesting run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Identifiers looked at, skipped ones included.
    pub processed: usize,
    /// New `Found` records written.
    pub found: usize,
    /// New `Filtered` records written.
    pub filtered: usize,
    /// Identifiers already present in the store.
    pub skipped: usize,
    /// Identifiers whose collection failed.
    pub failed: usize,
    /// One line per failure: `owner/name: message`.
    pub errors: Vec<String>,
    /// Set when enumeration stopped on an error.
    pub search_error: Option<String>,
    /// Set when the run stopped early on request.
    pub interrupted: bool,
}

impl HarvestSummary {
    /// New records written during the run.
    pub fn added(&self) -> usize {
        self.found + self.filtered
    }
}
