//! Scripted in-memory code host for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::platform::{
    ContentEntry, EntryKind, IssueState, PlatformClient, PlatformError, RateLimitState,
    RateLimits, ReleaseInfo, RepoDetails, RepoId, Result, SearchHit, SearchPage,
};
use crate::record::MetadataRecord;
use crate::repository::{self, IncrementalStore};

/// A repository served by [`FakePlatform`].
///
/// Directory listings are derived from the file paths, in insertion order.
#[derive(Debug, Clone)]
pub struct FakeRepo {
    pub details: RepoDetails,
    pub files: Vec<(String, Vec<u8>)>,
    pub topics: Vec<String>,
    pub languages: Vec<(String, u64)>,
    pub last_commit: Option<DateTime<Utc>>,
    pub releases: u64,
    pub latest_release: Option<ReleaseInfo>,
    pub issues: (u64, u64),
    pub pulls: (u64, u64),
    pub contributors: u64,
}

impl FakeRepo {
    pub fn new(owner: &str, name: &str) -> Self {
        let id = RepoId::new(owner, name);
        Self {
            details: RepoDetails {
                html_url: format!("https://github.com/{owner}/{name}"),
                id,
                description: None,
                homepage: None,
                language: None,
                created_at: None,
                updated_at: None,
                stars: 0,
                watchers: 0,
                forks: 0,
                archived: false,
                parent: None,
            },
            files: Vec::new(),
            topics: Vec::new(),
            languages: Vec::new(),
            last_commit: None,
            releases: 0,
            latest_release: None,
            issues: (0, 0),
            pulls: (0, 0),
            contributors: 0,
        }
    }

    pub fn file(mut self, path: &str, content: &[u8]) -> Self {
        self.files.push((path.to_string(), content.to_vec()));
        self
    }

    pub fn stars(mut self, stars: u64) -> Self {
        self.details.stars = stars;
        self
    }

    pub fn language(mut self, language: &str) -> Self {
        self.details.language = Some(language.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.details.description = Some(description.to_string());
        self
    }

    pub fn topics(mut self, topics: &[&str]) -> Self {
        self.topics = topics.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn languages(mut self, languages: &[(&str, u64)]) -> Self {
        self.languages = languages
            .iter()
            .map(|(l, b)| (l.to_string(), *b))
            .collect();
        self
    }

    pub fn last_commit(mut self, at: DateTime<Utc>) -> Self {
        self.last_commit = Some(at);
        self
    }

    pub fn releases(mut self, count: u64, latest: Option<ReleaseInfo>) -> Self {
        self.releases = count;
        self.latest_release = latest;
        self
    }

    pub fn issues(mut self, open: u64, closed: u64) -> Self {
        self.issues = (open, closed);
        self
    }

    pub fn pulls(mut self, open: u64, closed: u64) -> Self {
        self.pulls = (open, closed);
        self
    }

    pub fn contributors(mut self, count: u64) -> Self {
        self.contributors = count;
        self
    }

    fn list(&self, dir: &str) -> Option<Vec<ContentEntry>> {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let mut entries: Vec<ContentEntry> = Vec::new();
        for (path, _) in &self.files {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            let (name, kind) = match rest.split_once('/') {
                Some((dir_name, _)) => (dir_name, EntryKind::Dir),
                None => (rest, EntryKind::File),
            };
            if entries.iter().any(|e| e.name == name) {
                continue;
            }
            entries.push(ContentEntry {
                name: name.to_string(),
                path: format!("{prefix}{name}"),
                kind,
            });
        }

        if entries.is_empty() && !dir.is_empty() {
            return None;
        }
        Some(entries)
    }
}

struct FakeSearch {
    total: u64,
    hits: Vec<RepoId>,
}

struct FakeState {
    repos: HashMap<String, FakeRepo>,
    searches: HashMap<String, FakeSearch>,
    rate_limits: RateLimits,
    failures: HashMap<String, VecDeque<PlatformError>>,
    calls: Vec<(String, String)>,
    search_calls: Vec<(String, u32, u32)>,
    listings: Vec<(String, String)>,
}

/// In-memory [`PlatformClient`] with scripted failures and call recording.
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        let reset_at = Utc::now() + Duration::hours(1);
        Self {
            state: Mutex::new(FakeState {
                repos: HashMap::new(),
                searches: HashMap::new(),
                rate_limits: RateLimits {
                    core: full_budget(5000, reset_at),
                    search: full_budget(30, reset_at),
                },
                failures: HashMap::new(),
                calls: Vec::new(),
                search_calls: Vec::new(),
                listings: Vec::new(),
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_repo(&self, repo: FakeRepo) {
        self.state().repos.insert(repo.details.id.key(), repo);
    }

    /// Script the answer to an exact query string.
    ///
    /// `total` is what the host reports. Pages are sliced from `hits`.
    pub fn add_search(&self, query: &str, total: u64, hits: Vec<RepoId>) {
        self.state()
            .searches
            .insert(query.to_string(), FakeSearch { total, hits });
    }

    pub fn set_rate_limits(&self, core_reset: DateTime<Utc>, search_reset: DateTime<Utc>) {
        let mut state = self.state();
        state.rate_limits.core.reset_at = core_reset;
        state.rate_limits.search.reset_at = search_reset;
    }

    /// Fail the next call of `op` (a [`PlatformClient`] method name).
    pub fn fail_next(&self, op: &str, err: PlatformError) {
        self.state()
            .failures
            .entry(op.to_string())
            .or_default()
            .push_back(err);
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.state().calls.iter().filter(|(o, _)| o == op).count()
    }

    /// Every recorded call as `(method, argument)`.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.state().calls.clone()
    }

    /// `(page, per_page)` of every search issued for `query`.
    pub fn search_calls(&self, query: &str) -> Vec<(u32, u32)> {
        self.state()
            .search_calls
            .iter()
            .filter(|(q, _, _)| q == query)
            .map(|(_, page, per_page)| (*page, *per_page))
            .collect()
    }

    /// Directories listed for `repo`, in call order. The root is `""`.
    pub fn listed_paths(&self, repo: &RepoId) -> Vec<String> {
        let key = repo.key();
        self.state()
            .listings
            .iter()
            .filter(|(r, _)| *r == key)
            .map(|(_, path)| path.clone())
            .collect()
    }

    /// Record the call and pop a scripted failure, if any.
    fn enter(&self, op: &str, arg: String) -> Result<()> {
        let mut state = self.state();
        state.calls.push((op.to_string(), arg));
        match state.failures.get_mut(op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn with_repo<T>(&self, repo: &RepoId, f: impl FnOnce(&FakeRepo) -> Result<T>) -> Result<T> {
        let state = self.state();
        match state.repos.get(&repo.key()) {
            Some(found) => f(found),
            None => Err(PlatformError::not_found(repo.full_name())),
        }
    }
}

fn full_budget(limit: u64, reset_at: DateTime<Utc>) -> RateLimitState {
    RateLimitState {
        limit,
        used: 0,
        remaining: limit,
        reset_at,
    }
}

#[async_trait]
impl PlatformClient for FakePlatform {
    async fn rate_limits(&self) -> Result<RateLimits> {
        self.enter("rate_limits", String::new())?;
        Ok(self.state().rate_limits)
    }

    async fn search_repositories(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<SearchPage> {
        self.enter("search_repositories", query.to_string())?;
        let mut state = self.state();
        state.search_calls.push((query.to_string(), page, per_page));

        let Some(search) = state.searches.get(query) else {
            return Ok(SearchPage::default());
        };
        let start = (page.saturating_sub(1) as usize) * per_page as usize;
        let end = (start + per_page as usize).min(search.hits.len());
        let items = search
            .hits
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|repo| SearchHit {
                repo: repo.clone(),
                updated_at: None,
            })
            .collect();

        Ok(SearchPage {
            total_count: search.total,
            incomplete_results: false,
            items,
        })
    }

    async fn get_repo(&self, repo: &RepoId) -> Result<RepoDetails> {
        self.enter("get_repo", repo.full_name())?;
        self.with_repo(repo, |r| Ok(r.details.clone()))
    }

    async fn list_dir(&self, repo: &RepoId, path: &str) -> Result<Vec<ContentEntry>> {
        self.enter("list_dir", format!("{repo}:{path}"))?;
        self.state().listings.push((repo.key(), path.to_string()));
        self.with_repo(repo, |r| {
            r.list(path)
                .ok_or_else(|| PlatformError::not_found(format!("{repo}/{path}")))
        })
    }

    async fn get_file(&self, repo: &RepoId, path: &str) -> Result<Vec<u8>> {
        self.enter("get_file", format!("{repo}:{path}"))?;
        self.with_repo(repo, |r| {
            r.files
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, content)| content.clone())
                .ok_or_else(|| PlatformError::not_found(format!("{repo}/{path}")))
        })
    }

    async fn list_topics(&self, repo: &RepoId) -> Result<Vec<String>> {
        self.enter("list_topics", repo.full_name())?;
        self.with_repo(repo, |r| Ok(r.topics.clone()))
    }

    async fn list_languages(&self, repo: &RepoId) -> Result<Vec<(String, u64)>> {
        self.enter("list_languages", repo.full_name())?;
        self.with_repo(repo, |r| Ok(r.languages.clone()))
    }

    async fn latest_commit_date(&self, repo: &RepoId) -> Result<Option<DateTime<Utc>>> {
        self.enter("latest_commit_date", repo.full_name())?;
        self.with_repo(repo, |r| Ok(r.last_commit))
    }

    async fn count_releases(&self, repo: &RepoId) -> Result<u64> {
        self.enter("count_releases", repo.full_name())?;
        self.with_repo(repo, |r| Ok(r.releases))
    }

    async fn latest_release(&self, repo: &RepoId) -> Result<Option<ReleaseInfo>> {
        self.enter("latest_release", repo.full_name())?;
        self.with_repo(repo, |r| Ok(r.latest_release.clone()))
    }

    async fn count_issues(&self, repo: &RepoId, state: IssueState) -> Result<u64> {
        self.enter("count_issues", format!("{repo}:{}", state.as_str()))?;
        self.with_repo(repo, |r| {
            Ok(match state {
                IssueState::Open => r.issues.0,
                IssueState::Closed => r.issues.1,
            })
        })
    }

    async fn count_pulls(&self, repo: &RepoId, state: IssueState) -> Result<u64> {
        self.enter("count_pulls", format!("{repo}:{}", state.as_str()))?;
        self.with_repo(repo, |r| {
            Ok(match state {
                IssueState::Open => r.pulls.0,
                IssueState::Closed => r.pulls.1,
            })
        })
    }

    async fn count_contributors(&self, repo: &RepoId) -> Result<u64> {
        self.enter("count_contributors", repo.full_name())?;
        self.with_repo(repo, |r| Ok(r.contributors))
    }
}

/// [`IncrementalStore`] over a map, for engine tests that do not need SQL.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, MetadataRecord>>,
}

impl MemoryStore {
    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<String, MetadataRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, repo: &RepoId) -> Option<MetadataRecord> {
        self.records().get(&repo.key()).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }
}

#[async_trait]
impl IncrementalStore for MemoryStore {
    async fn contains(&self, repo: &RepoId) -> repository::Result<bool> {
        Ok(self.records().contains_key(&repo.key()))
    }

    async fn record(&self, record: &MetadataRecord) -> repository::Result<bool> {
        let mut records = self.records();
        let key = record.id().key();
        if records.contains_key(&key) {
            return Ok(false);
        }
        records.insert(key, record.clone());
        Ok(true)
    }
}
