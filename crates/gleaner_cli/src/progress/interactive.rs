use std::sync::Mutex;
use std::time::Duration;

use gleaner::harvest::HarvestProgress;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const TICK: Duration = Duration::from_millis(100);

#[derive(Default)]
struct Outcomes {
    found: usize,
    filtered: usize,
    skipped: usize,
    failed: usize,
}

impl Outcomes {
    fn message(&self) -> String {
        format!(
            "{} found, {} filtered, {} skipped, {} failed",
            self.found, self.filtered, self.skipped, self.failed
        )
    }
}

#[derive(Default)]
struct ProgressState {
    /// Spinner for the search windows, created on the first window.
    search_bar: Option<ProgressBar>,
    /// Counter of processed identifiers.
    collect_bar: Option<ProgressBar>,
    outcomes: Outcomes,
}

/// Interactive progress reporter using indicatif.
///
/// One spinner follows the search windows, one counter follows collection.
/// Failures and rate-limit pauses are printed above the bars.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self::with_multi(MultiProgress::new())
    }

    /// Reporter that draws nothing.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_multi(MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden()))
    }

    fn with_multi(multi: MultiProgress) -> Self {
        Self {
            multi,
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// `(found, filtered, skipped, failed)` so far.
    #[cfg(test)]
    pub fn outcomes(&self) -> (usize, usize, usize, usize) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let o = &state.outcomes;
        (o.found, o.filtered, o.skipped, o.failed)
    }

    pub fn handle(&self, event: HarvestProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            HarvestProgress::WindowCounted {
                window,
                total,
                subdivided,
            } => {
                let bar = self.search_bar(&mut state);
                if subdivided {
                    bar.set_message(format!("{window}: {total} results, splitting"));
                } else {
                    bar.set_message(format!("{window}: {total} results"));
                }
            }

            HarvestProgress::FetchedPage {
                window,
                page,
                total_so_far,
                ..
            } => {
                let bar = self.search_bar(&mut state);
                bar.set_message(format!("{window}: page {page}, {total_so_far} fetched"));
            }

            HarvestProgress::RateLimited {
                category,
                reset_at,
                wait,
                ..
            } => {
                self.multi
                    .println(format!(
                        "⏳ {} budget exhausted, waiting {}s (resets {})",
                        category.as_str(),
                        wait.as_secs(),
                        reset_at.format("%H:%M:%S")
                    ))
                    .ok();
            }

            HarvestProgress::Collecting { repo, .. } => {
                let bar = self.collect_bar(&mut state);
                bar.set_prefix(format!("{:30}", repo.full_name()));
            }

            HarvestProgress::Skipped { .. } => {
                state.outcomes.skipped += 1;
                self.advance(&mut state);
            }

            HarvestProgress::Found { .. } => {
                state.outcomes.found += 1;
                self.advance(&mut state);
            }

            HarvestProgress::Filtered { .. } => {
                state.outcomes.filtered += 1;
                self.advance(&mut state);
            }

            HarvestProgress::Failed { repo, error } => {
                state.outcomes.failed += 1;
                self.multi.println(format!("✗ {repo}: {error}")).ok();
                self.advance(&mut state);
            }

            HarvestProgress::SearchFailed { error } => {
                if let Some(bar) = state.search_bar.take() {
                    bar.abandon_with_message(format!("✗ search failed: {error}"));
                }
            }

            HarvestProgress::Complete { .. } => {
                Self::finish_state(&mut state);
            }

            _ => {}
        }
    }

    fn search_bar(&self, state: &mut ProgressState) -> ProgressBar {
        state
            .search_bar
            .get_or_insert_with(|| {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(Self::spinner_style());
                bar.set_prefix("search");
                bar.enable_steady_tick(TICK);
                bar
            })
            .clone()
    }

    fn collect_bar(&self, state: &mut ProgressState) -> ProgressBar {
        state
            .collect_bar
            .get_or_insert_with(|| {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(Self::counter_style());
                bar.enable_steady_tick(TICK);
                bar
            })
            .clone()
    }

    fn advance(&self, state: &mut ProgressState) {
        let message = state.outcomes.message();
        let bar = self.collect_bar(state);
        bar.inc(1);
        bar.set_message(message);
    }

    fn finish_state(state: &mut ProgressState) {
        if let Some(bar) = state.search_bar.take() {
            bar.finish_with_message("✓ search exhausted");
        }
        if let Some(bar) = state.collect_bar.take() {
            bar.set_prefix("collected");
            bar.finish_with_message(format!("✓ {}", state.outcomes.message()));
        }
    }

    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Self::finish_state(&mut state);
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .expect("Invalid template")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn counter_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {pos:>5} {msg}")
            .expect("Invalid template")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
