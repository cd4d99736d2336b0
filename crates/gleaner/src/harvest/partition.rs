//! Exhaustive search enumeration under a per-query result cap.
//!
//! The host silently truncates any search beyond the cap, so a window whose
//! count reaches it is replaced by its finer sub-windows (year, then month,
//! then day) until each one fits. Day windows that still reach the cap are
//! paginated as far as the host allows.

use std::collections::VecDeque;

use chrono::{Datelike, Utc};

use crate::platform::{BudgetCategory, RepoId, Result, SearchHit};
use crate::retry::RateLimitGuard;

use super::progress::{HarvestProgress, ProgressCallback, emit};
use super::types::SearchOptions;
use super::window::SearchWindow;

/// Builds [`SearchCursor`]s.
pub struct QueryPartitioner<'a> {
    guard: &'a RateLimitGuard,
    options: SearchOptions,
    on_progress: Option<&'a ProgressCallback>,
}

impl<'a> QueryPartitioner<'a> {
    pub fn new(guard: &'a RateLimitGuard, options: SearchOptions) -> Self {
        Self {
            guard,
            options,
            on_progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, on_progress: Option<&'a ProgressCallback>) -> Self {
        self.on_progress = on_progress;
        self
    }

    /// Cursor over every year from the first configured year to the last
    /// (the current year by default).
    pub fn enumerate(self) -> SearchCursor<'a> {
        let last_year = self.options.last_year.unwrap_or_else(|| Utc::now().year());
        let windows = SearchWindow::years(self.options.first_year, last_year);
        self.enumerate_windows(windows)
    }

    /// Cursor over explicit starting windows, visited in the given order.
    pub fn enumerate_windows(self, windows: Vec<SearchWindow>) -> SearchCursor<'a> {
        SearchCursor {
            guard: self.guard,
            options: self.options,
            on_progress: self.on_progress,
            pending: windows.into(),
            active: None,
            buffer: VecDeque::new(),
            stats: CursorStats::default(),
        }
    }
}

/// Counters kept by a cursor while it runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorStats {
    pub windows_counted: usize,
    pub windows_subdivided: usize,
    pub pages_fetched: usize,
    pub yielded: usize,
    pub excluded: usize,
}

/// Window currently being paginated.
struct ActiveWindow {
    window: SearchWindow,
    query: String,
    /// Results the host will actually hand out for this window.
    expected: u64,
    next_page: u32,
    fetched: u64,
    exhausted: bool,
}

/// Lazy, finite, single-pass sequence of search results.
///
/// Each call to [`next`](Self::next) performs at most the remote calls needed
/// to produce one more identifier. Identifiers are yielded once per window;
/// the same repository can still show up in two windows and is left for the
/// store to collapse.
pub struct SearchCursor<'a> {
    guard: &'a RateLimitGuard,
    options: SearchOptions,
    on_progress: Option<&'a ProgressCallback>,
    pending: VecDeque<SearchWindow>,
    active: Option<ActiveWindow>,
    buffer: VecDeque<SearchHit>,
    stats: CursorStats,
}

impl SearchCursor<'_> {
    /// Next identifier, or `None` once every window is exhausted.
    ///
    /// An error leaves the cursor where it was; calling `next` again retries
    /// the failed request.
    pub async fn next(&mut self) -> Result<Option<RepoId>> {
        loop {
            while let Some(hit) = self.buffer.pop_front() {
                if self.options.exclude.is_excluded(&hit.repo) {
                    tracing::debug!(repo = %hit.repo, "Excluded search result");
                    self.stats.excluded += 1;
                    emit(self.on_progress, HarvestProgress::Excluded { repo: hit.repo });
                    continue;
                }
                self.stats.yielded += 1;
                return Ok(Some(hit.repo));
            }

            match self.active.as_ref().map(|active| active.exhausted) {
                Some(false) => {
                    self.fetch_page().await?;
                    continue;
                }
                Some(true) => self.active = None,
                None => {}
            }

            let Some(window) = self.pending.front().copied() else {
                return Ok(None);
            };
            self.open_window(window).await?;
            self.pending.pop_front();
        }
    }

    /// Drain the cursor into a vector.
    pub async fn collect_all(&mut self) -> Result<Vec<RepoId>> {
        let mut repos = Vec::new();
        while let Some(repo) = self.next().await? {
            repos.push(repo);
        }
        Ok(repos)
    }

    pub fn stats(&self) -> CursorStats {
        self.stats
    }

    /// Count the window's results and either schedule its sub-windows or
    /// start paginating it.
    ///
    /// The caller pops `window` from `pending` only after this succeeds, and
    /// sub-windows are inserted right behind it.
    async fn open_window(&mut self, window: SearchWindow) -> Result<()> {
        let query = window.query(&self.options.base_query);
        let label = window.to_string();

        let first = self
            .guard
            .invoke(BudgetCategory::Search, |api| {
                api.search_repositories(&query, 1, 1)
            })
            .await?;
        let total = first.total_count;
        self.stats.windows_counted += 1;

        let subdivide = total >= self.options.cap && window.can_subdivide();
        emit(
            self.on_progress,
            HarvestProgress::WindowCounted {
                window: label.clone(),
                total,
                subdivided: subdivide,
            },
        );

        if subdivide {
            let children = window.subdivide();
            tracing::info!(
                window = %label,
                total,
                cap = self.options.cap,
                sub_windows = children.len(),
                "Search window over cap, subdividing"
            );
            self.stats.windows_subdivided += 1;
            // Keep `window` itself at the front; the caller pops it.
            for child in children.into_iter().rev() {
                self.pending.insert(1, child);
            }
            return Ok(());
        }

        if total >= self.options.cap {
            tracing::warn!(
                window = %label,
                total,
                cap = self.options.cap,
                "Day window over cap, results beyond the cap are unreachable"
            );
        } else {
            tracing::debug!(window = %label, total, "Paginating search window");
        }

        let expected = total.min(self.options.cap);
        self.active = Some(ActiveWindow {
            window,
            query,
            expected,
            next_page: 1,
            fetched: 0,
            exhausted: expected == 0,
        });
        Ok(())
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let guard = self.guard;
        let per_page = self.options.per_page;
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };

        let page_number = active.next_page;
        let query = active.query.as_str();
        let page = guard
            .invoke(BudgetCategory::Search, |api| {
                api.search_repositories(query, page_number, per_page)
            })
            .await?;

        let count = page.items.len();
        active.fetched += count as u64;
        active.next_page += 1;
        active.exhausted =
            count == 0 || count < per_page as usize || active.fetched >= active.expected;
        self.stats.pages_fetched += 1;

        if page.incomplete_results {
            tracing::warn!(
                window = %active.window,
                page = page_number,
                "Search reported incomplete results"
            );
        }

        emit(
            self.on_progress,
            HarvestProgress::FetchedPage {
                window: active.window.to_string(),
                page: page_number,
                count,
                total_so_far: active.fetched,
            },
        );

        self.buffer.extend(page.items);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::harvest::types::ExclusionList;
    use crate::platform::PlatformError;
    use crate::testing::FakePlatform;

    const BASE: &str = "nextflow in:readme";

    fn options() -> SearchOptions {
        SearchOptions {
            base_query: BASE.to_string(),
            first_year: 2021,
            last_year: Some(2021),
            exclude: ExclusionList::new(["nextflow-io", "nf-core/tools"]),
            ..SearchOptions::default()
        }
    }

    fn repos(prefix: &str, n: usize) -> Vec<RepoId> {
        (0..n)
            .map(|i| RepoId::new(format!("{prefix}-owner"), format!("repo-{i}")))
            .collect()
    }

    fn year_query(year: i32) -> String {
        SearchWindow::year(year).unwrap().query(BASE)
    }

    fn month_query(year: i32, month: u32) -> String {
        SearchWindow::month(year, month).unwrap().query(BASE)
    }

    #[tokio::test]
    async fn under_cap_window_is_paginated_completely() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_search(&year_query(2021), 250, repos("a", 250));
        let guard = RateLimitGuard::new(fake.clone());

        let mut cursor = QueryPartitioner::new(&guard, options()).enumerate();
        let found = cursor.collect_all().await.unwrap();

        assert_eq!(found.len(), 250);
        assert_eq!(found, repos("a", 250));
        // One count query plus three pages of 100, 100 and 50.
        assert_eq!(
            fake.search_calls(&year_query(2021)),
            vec![(1, 1), (1, 100), (2, 100), (3, 100)]
        );
        assert_eq!(cursor.stats().pages_fetched, 3);
    }

    #[tokio::test]
    async fn over_cap_year_issues_twelve_month_queries() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_search(&year_query(2021), 1500, Vec::new());
        for month in 1..=12 {
            let hits = repos(&format!("m{month}"), 125);
            fake.add_search(&month_query(2021, month), 125, hits);
        }
        let guard = RateLimitGuard::new(fake.clone());

        let mut cursor = QueryPartitioner::new(&guard, options()).enumerate();
        let found = cursor.collect_all().await.unwrap();

        assert_eq!(found.len(), 12 * 125);
        // The over-cap year only ever saw its count query.
        assert_eq!(fake.search_calls(&year_query(2021)), vec![(1, 1)]);
        for month in 1..=12 {
            let calls = fake.search_calls(&month_query(2021, month));
            assert_eq!(calls.first(), Some(&(1, 1)), "month {month} counted first");
            assert_eq!(calls.len(), 3, "month {month}: count + 2 pages");
        }
        // Months are visited chronologically.
        assert_eq!(found[0].owner, "m1-owner");
        assert_eq!(found.last().unwrap().owner, "m12-owner");
        assert_eq!(cursor.stats().windows_subdivided, 1);
        assert_eq!(cursor.stats().windows_counted, 13);
    }

    #[tokio::test]
    async fn over_cap_month_subdivides_into_days() {
        let fake = Arc::new(FakePlatform::new());
        let feb = SearchWindow::month(2021, 2).unwrap();
        fake.add_search(&feb.query(BASE), 1000, Vec::new());
        let day = SearchWindow::day(chrono::NaiveDate::from_ymd_opt(2021, 2, 14).unwrap());
        fake.add_search(&day.query(BASE), 3, repos("valentine", 3));
        let guard = RateLimitGuard::new(fake.clone());

        let mut cursor = QueryPartitioner::new(&guard, options()).enumerate_windows(vec![feb]);
        let found = cursor.collect_all().await.unwrap();

        assert_eq!(found, repos("valentine", 3));
        assert_eq!(fake.search_calls(&feb.query(BASE)), vec![(1, 1)]);
        // 28 day windows counted plus the month itself.
        assert_eq!(cursor.stats().windows_counted, 29);
    }

    #[tokio::test]
    async fn over_cap_day_is_paginated_up_to_the_cap() {
        let fake = Arc::new(FakePlatform::new());
        let day = SearchWindow::day(chrono::NaiveDate::from_ymd_opt(2021, 6, 1).unwrap());
        fake.add_search(&day.query(BASE), 1200, repos("busy", 1200));
        let guard = RateLimitGuard::new(fake.clone());

        let mut cursor = QueryPartitioner::new(&guard, options()).enumerate_windows(vec![day]);
        let found = cursor.collect_all().await.unwrap();

        assert_eq!(found.len(), 1000);
        assert_eq!(cursor.stats().windows_subdivided, 0);
        assert_eq!(cursor.stats().pages_fetched, 10);
    }

    #[tokio::test]
    async fn excluded_entries_are_dropped_silently() {
        let fake = Arc::new(FakePlatform::new());
        let hits = vec![
            RepoId::new("nf-core", "rnaseq"),
            RepoId::new("nextflow-io", "rnaseq-nf"),
            RepoId::new("nf-core", "tools"),
            RepoId::new("someone", "pipeline"),
        ];
        fake.add_search(&year_query(2021), hits.len() as u64, hits);
        let guard = RateLimitGuard::new(fake.clone());

        let mut cursor = QueryPartitioner::new(&guard, options()).enumerate();
        let found = cursor.collect_all().await.unwrap();

        assert_eq!(
            found,
            vec![RepoId::new("nf-core", "rnaseq"), RepoId::new("someone", "pipeline")]
        );
        // Yielded equals reported count minus excluded.
        assert_eq!(cursor.stats().yielded, 4 - cursor.stats().excluded);
        assert_eq!(cursor.stats().excluded, 2);
    }

    #[tokio::test]
    async fn empty_window_makes_only_the_count_query() {
        let fake = Arc::new(FakePlatform::new());
        let guard = RateLimitGuard::new(fake.clone());

        let mut cursor = QueryPartitioner::new(&guard, options()).enumerate();
        assert_eq!(cursor.next().await.unwrap(), None);
        assert_eq!(fake.search_calls(&year_query(2021)), vec![(1, 1)]);
        // Exhausted cursors stay exhausted.
        assert_eq!(cursor.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn windows_run_in_chronological_order() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_search(&year_query(2019), 1, vec![RepoId::new("old", "one")]);
        fake.add_search(&year_query(2020), 1, vec![RepoId::new("mid", "one")]);
        fake.add_search(&year_query(2021), 1, vec![RepoId::new("new", "one")]);
        let guard = RateLimitGuard::new(fake.clone());

        let opts = SearchOptions {
            first_year: 2019,
            ..options()
        };
        let mut cursor = QueryPartitioner::new(&guard, opts).enumerate();
        let owners: Vec<String> = cursor
            .collect_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.owner)
            .collect();

        assert_eq!(owners, vec!["old", "mid", "new"]);
    }

    #[tokio::test]
    async fn error_is_returned_and_the_cursor_can_resume() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_search(&year_query(2021), 2, repos("r", 2));
        fake.fail_next("search_repositories", PlatformError::api(502, "bad gateway"));
        let guard = RateLimitGuard::new(fake.clone());

        let mut cursor = QueryPartitioner::new(&guard, options()).enumerate();
        assert!(cursor.next().await.is_err());
        let found = cursor.collect_all().await.unwrap();
        assert_eq!(found, repos("r", 2));
    }
}
