//! Feeds identifiers through the store check, the collector and back into
//! the store, one at a time.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::platform::RepoId;
use crate::record::MetadataRecord;
use crate::repository::IncrementalStore;

use super::collect::MetadataCollector;
use super::errors::HarvestError;
use super::partition::SearchCursor;
use super::progress::{HarvestProgress, ProgressCallback, emit};
use super::types::{CollectOptions, HarvestSummary};

/// What happened to one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    Found,
    Filtered,
    Failed,
}

/// Sequential harvesting driver.
///
/// Store failures end the run. Collection failures are counted in the
/// summary and the run moves on to the next identifier.
pub struct Harvester<'a, S: IncrementalStore + ?Sized> {
    collector: MetadataCollector<'a>,
    store: &'a S,
    on_progress: Option<&'a ProgressCallback>,
    stop: Option<&'a AtomicBool>,
}

impl<'a, S: IncrementalStore + ?Sized> Harvester<'a, S> {
    pub fn new(collector: MetadataCollector<'a>, store: &'a S) -> Self {
        Self {
            collector,
            store,
            on_progress: None,
            stop: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, on_progress: Option<&'a ProgressCallback>) -> Self {
        self.on_progress = on_progress;
        self
    }

    /// Stop between identifiers once `flag` is set.
    #[must_use]
    pub fn with_stop_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.stop = Some(flag);
        self
    }

    fn should_stop(&self) -> bool {
        self.stop.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Process a fixed list of identifiers.
    pub async fn run_ids<I>(
        &self,
        ids: I,
        options: CollectOptions,
    ) -> Result<HarvestSummary, HarvestError>
    where
        I: IntoIterator<Item = RepoId>,
    {
        let mut summary = HarvestSummary::default();
        for repo in ids {
            if self.should_stop() {
                summary.interrupted = true;
                break;
            }
            self.process(&repo, options, &mut summary).await?;
        }
        Ok(self.finish(summary))
    }

    /// Drain `cursor`, processing at most `limit` identifiers.
    ///
    /// A search failure stops enumeration. It is reported in the summary
    /// rather than returned, so the records written so far stay counted.
    pub async fn run_search(
        &self,
        cursor: &mut SearchCursor<'_>,
        options: CollectOptions,
        limit: Option<usize>,
    ) -> Result<HarvestSummary, HarvestError> {
        let mut summary = HarvestSummary::default();
        loop {
            if limit.is_some_and(|limit| summary.processed >= limit) {
                break;
            }
            if self.should_stop() {
                summary.interrupted = true;
                break;
            }

            let repo = match cursor.next().await {
                Ok(Some(repo)) => repo,
                Ok(None) => break,
                Err(e) => {
                    let message = crate::platform::short_error_message(&e);
                    tracing::error!(error = %message, "Search enumeration failed");
                    emit(
                        self.on_progress,
                        HarvestProgress::SearchFailed {
                            error: message.clone(),
                        },
                    );
                    summary.search_error = Some(message);
                    break;
                }
            };
            self.process(&repo, options, &mut summary).await?;
        }
        Ok(self.finish(summary))
    }

    /// Store check, collection and write for one identifier.
    pub async fn process(
        &self,
        repo: &RepoId,
        options: CollectOptions,
        summary: &mut HarvestSummary,
    ) -> Result<Outcome, HarvestError> {
        summary.processed += 1;
        emit(
            self.on_progress,
            HarvestProgress::Collecting {
                repo: repo.clone(),
                index: summary.processed,
            },
        );

        if self.store.contains(repo).await? {
            tracing::debug!(repo = %repo, "Already recorded, skipping");
            return Ok(self.skipped(repo, summary));
        }

        let record = match self.collector.collect(repo, options).await {
            Ok(record) => record,
            Err(e) => {
                let error = HarvestError::from(e).short_message();
                tracing::warn!(repo = %repo, error = %error, "Collection failed");
                summary.failed += 1;
                summary.errors.push(format!("{repo}: {error}"));
                emit(
                    self.on_progress,
                    HarvestProgress::Failed {
                        repo: repo.clone(),
                        error,
                    },
                );
                return Ok(Outcome::Failed);
            }
        };

        if !self.store.record(&record).await? {
            return Ok(self.skipped(repo, summary));
        }

        match &record {
            MetadataRecord::Found(found) => {
                tracing::info!(repo = %repo, stars = found.stars, "Recorded repository");
                summary.found += 1;
                emit(self.on_progress, HarvestProgress::Found { repo: repo.clone() });
                Ok(Outcome::Found)
            }
            MetadataRecord::Filtered(filtered) => {
                tracing::info!(repo = %repo, reason = %filtered.reason, "Filtered repository");
                summary.filtered += 1;
                emit(
                    self.on_progress,
                    HarvestProgress::Filtered {
                        repo: repo.clone(),
                        reason: filtered.reason,
                    },
                );
                Ok(Outcome::Filtered)
            }
        }
    }

    fn skipped(&self, repo: &RepoId, summary: &mut HarvestSummary) -> Outcome {
        summary.skipped += 1;
        emit(self.on_progress, HarvestProgress::Skipped { repo: repo.clone() });
        Outcome::Skipped
    }

    fn finish(&self, summary: HarvestSummary) -> HarvestSummary {
        tracing::info!(
            processed = summary.processed,
            found = summary.found,
            filtered = summary.filtered,
            skipped = summary.skipped,
            failed = summary.failed,
            interrupted = summary.interrupted,
            "Harvest finished"
        );
        emit(
            self.on_progress,
            HarvestProgress::Complete {
                summary: summary.clone(),
            },
        );
        summary
    }
}
