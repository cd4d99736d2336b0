//! Setup shared by the harvesting commands.

use std::sync::Arc;

use console::style;
use gleaner::github::{GitHubClient, GitHubError};
use gleaner::harvest::HarvestSummary;
use gleaner::retry::RateLimitGuard;
use sea_orm::{DatabaseConnection, DbErr};

use crate::config::Config;
use crate::progress::ProgressReporter;

/// Connect to the store, applying pending migrations.
pub(crate) async fn open_store(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    gleaner::connect_and_migrate(database_url).await
}

/// GitHub client wrapped in the rate-limit guard, reporting pauses to `reporter`.
pub(crate) fn build_guard(
    config: &Config,
    reporter: &Arc<ProgressReporter>,
) -> Result<RateLimitGuard, GitHubError> {
    let client = GitHubClient::new(config.github_token())?;
    if !client.is_authenticated() {
        tracing::warn!("No GitHub token configured, using the anonymous rate limit");
    }

    Ok(RateLimitGuard::new(Arc::new(client))
        .with_margin(config.harvest.safety_margin())
        .with_progress(reporter.as_callback()))
}

/// One line per count, failures listed below.
pub(crate) fn summary_lines(summary: &HarvestSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Added {} records ({} found, {} filtered), {} already recorded, {} failed",
        summary.added(),
        summary.found,
        summary.filtered,
        summary.skipped,
        summary.failed
    )];
    lines.extend(summary.errors.iter().map(|e| format!("  {e}")));
    if let Some(error) = &summary.search_error {
        lines.push(format!("Search stopped early: {error}"));
    }
    if summary.interrupted {
        lines.push("Interrupted before the end of the input".to_string());
    }
    lines
}

pub(crate) fn print_summary(summary: &HarvestSummary) {
    let lines = summary_lines(summary);
    let ok = summary.failed == 0 && summary.search_error.is_none() && !summary.interrupted;
    for (i, line) in lines.iter().enumerate() {
        if i == 0 && ok {
            println!("{} {}", style("✓").green(), line);
        } else if i == 0 {
            println!("{} {}", style("!").yellow(), line);
        } else {
            println!("{}", style(line).dim());
        }
    }
}
