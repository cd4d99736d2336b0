//! Incremental store: the set of repositories already processed.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

use crate::entity::filtered_repository::{
    Column as FilteredColumn, Entity as FilteredRepository,
};
use crate::entity::found_repository::{Column as FoundColumn, Entity as FoundRepository};
use crate::platform::RepoId;
use crate::record::MetadataRecord;

use super::convert::{filtered_active_model, found_active_model};
use super::errors::Result;

/// Keyed set of processed repositories.
///
/// Keys are the lowercased `owner/name`. A record, once written, is never
/// replaced.
#[async_trait]
pub trait IncrementalStore: Send + Sync {
    /// Whether either record table holds `repo`.
    async fn contains(&self, repo: &RepoId) -> Result<bool>;

    /// Persist `record` unless its key is already present.
    ///
    /// Returns `true` when a row was written.
    async fn record(&self, record: &MetadataRecord) -> Result<bool>;
}

#[async_trait]
impl IncrementalStore for DatabaseConnection {
    async fn contains(&self, repo: &RepoId) -> Result<bool> {
        let key = repo.key();
        if FoundRepository::find_by_id(key.clone()).count(self).await? > 0 {
            return Ok(true);
        }
        Ok(FilteredRepository::find_by_id(key).count(self).await? > 0)
    }

    async fn record(&self, record: &MetadataRecord) -> Result<bool> {
        let now = Utc::now();
        // Single statement per record, so a crash never leaves half a row.
        let rows = match record {
            MetadataRecord::Found(found) => {
                FoundRepository::insert(found_active_model(found, now)?)
                    .on_conflict(OnConflict::column(FoundColumn::Key).do_nothing().to_owned())
                    .exec_without_returning(self)
                    .await?
            }
            MetadataRecord::Filtered(filtered) => {
                FilteredRepository::insert(filtered_active_model(filtered, now))
                    .on_conflict(
                        OnConflict::column(FilteredColumn::Key)
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(self)
                    .await?
            }
        };

        tracing::debug!(repo = %record.id(), written = rows > 0, "Recorded outcome");
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, QueryTrait};

    use super::*;
    use crate::record::{FilterReason, FilteredRecord};

    #[test]
    fn insert_statement_ignores_conflicts_on_key() {
        let record = FilteredRecord::new(RepoId::new("a", "b"), FilterReason::NoMarkerFiles);
        let sql = FilteredRepository::insert(filtered_active_model(&record, Utc::now()))
            .on_conflict(
                OnConflict::column(FilteredColumn::Key)
                    .do_nothing()
                    .to_owned(),
            )
            .build(DatabaseBackend::Sqlite)
            .to_string();

        assert!(sql.contains("ON CONFLICT"), "{sql}");
        assert!(sql.contains("DO NOTHING"), "{sql}");
        assert!(sql.contains("\"key\""), "{sql}");
    }
}
