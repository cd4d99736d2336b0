//! `search`, `seeds` and `collect`.

use std::path::Path;
use std::sync::Arc;

use gleaner::RepoId;
use gleaner::discovery::parse_seed_list;
use gleaner::harvest::{
    CollectOptions, HarvestSummary, Harvester, MetadataCollector, QueryPartitioner,
};

use crate::commands::shared::{build_guard, open_store, print_summary};
use crate::config::Config;
use crate::progress::ProgressReporter;
use crate::shutdown;

/// Enumerate the search space and collect every result.
pub(crate) async fn handle_search(
    limit: Option<usize>,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_store(database_url).await?;
    let reporter = Arc::new(ProgressReporter::new());
    let guard = build_guard(config, &reporter)?;
    let callback = reporter.as_callback();

    let mut cursor = QueryPartitioner::new(&guard, config.harvest.search_options())
        .with_progress(Some(&callback))
        .enumerate();
    let collector = MetadataCollector::new(&guard, config.harvest.collector_config());
    let result = Harvester::new(collector, &db)
        .with_progress(Some(&callback))
        .with_stop_flag(shutdown::stop_flag())
        .run_search(&mut cursor, CollectOptions::for_search(), limit)
        .await;
    reporter.finish();

    let summary = result?;
    tracing::debug!(stats = ?cursor.stats(), "Search cursor finished");
    print_summary(&summary);
    Ok(())
}

/// Collect every entry of a curated seed document.
pub(crate) async fn handle_seeds(
    file: &Path,
    require_markers: bool,
    limit: Option<usize>,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = tokio::fs::read_to_string(file).await?;
    let seeds = parse_seed_list(&text);
    tracing::info!(file = %file.display(), seeds = seeds.len(), "Parsed seed list");

    let ids: Vec<RepoId> = seeds
        .iter()
        .filter_map(|seed| match seed.repo_id() {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(name = %seed.name, error = %e, "Skipping seed");
                None
            }
        })
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    let options = CollectOptions {
        require_marker_files: require_markers,
        ..CollectOptions::for_seed_list()
    };
    let summary = run_ids(ids, options, config, database_url).await?;
    print_summary(&summary);
    Ok(())
}

/// Collect explicitly named repositories.
pub(crate) async fn handle_collect(
    inputs: &[String],
    require_markers: bool,
    no_readme: bool,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let ids = inputs
        .iter()
        .map(|input| RepoId::parse(input))
        .collect::<Result<Vec<_>, _>>()?;

    let options = CollectOptions {
        save_readme: !no_readme,
        require_marker_files: require_markers,
    };
    let summary = run_ids(ids, options, config, database_url).await?;
    print_summary(&summary);
    Ok(())
}

async fn run_ids(
    ids: Vec<RepoId>,
    options: CollectOptions,
    config: &Config,
    database_url: &str,
) -> Result<HarvestSummary, Box<dyn std::error::Error>> {
    let db = open_store(database_url).await?;
    let reporter = Arc::new(ProgressReporter::new());
    let guard = build_guard(config, &reporter)?;
    let callback = reporter.as_callback();

    let collector = MetadataCollector::new(&guard, config.harvest.collector_config());
    let result = Harvester::new(collector, &db)
        .with_progress(Some(&callback))
        .with_stop_flag(shutdown::stop_flag())
        .run_ids(ids, options)
        .await;
    reporter.finish();

    Ok(result?)
}
