use gleaner::harvest::HarvestProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: HarvestProgress) {
        match event {
            HarvestProgress::WindowCounted {
                window,
                total,
                subdivided,
            } => {
                if subdivided {
                    tracing::info!(window = %window, total, "Window over the cap, subdividing");
                } else {
                    tracing::info!(window = %window, total, "Counted search window");
                }
            }

            HarvestProgress::FetchedPage {
                window,
                page,
                count,
                total_so_far,
            } => {
                tracing::debug!(window = %window, page, count, total_so_far, "Fetched page");
            }

            HarvestProgress::Excluded { repo } => {
                tracing::debug!(repo = %repo, "Excluded");
            }

            HarvestProgress::RateLimited {
                category,
                reset_at,
                wait,
                attempt,
            } => {
                tracing::warn!(
                    category = category.as_str(),
                    reset_at = %reset_at,
                    wait_secs = wait.as_secs(),
                    attempt,
                    "Rate limited, waiting for reset"
                );
            }

            HarvestProgress::Collecting { repo, index } => {
                tracing::debug!(repo = %repo, index, "Collecting");
            }

            HarvestProgress::Skipped { repo } => {
                tracing::debug!(repo = %repo, "Already recorded");
            }

            HarvestProgress::Found { repo } => {
                tracing::info!(repo = %repo, "Found");
            }

            HarvestProgress::Filtered { repo, reason } => {
                tracing::info!(repo = %repo, reason = reason.as_str(), "Filtered");
            }

            HarvestProgress::Failed { repo, error } => {
                tracing::error!(repo = %repo, error = %error, "Collection failed");
            }

            HarvestProgress::SearchFailed { error } => {
                tracing::error!(error = %error, "Search failed");
            }

            HarvestProgress::Complete { summary } => {
                tracing::info!(
                    found = summary.found,
                    filtered = summary.filtered,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "Harvest complete"
                );
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
