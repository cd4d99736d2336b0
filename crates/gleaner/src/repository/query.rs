use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::entity::filtered_repository::{
    Column as FilteredColumn, Entity as FilteredRepository,
};
use crate::entity::found_repository::{Column as FoundColumn, Entity as FoundRepository};
use crate::platform::RepoId;
use crate::record::{FilterReason, FilteredRecord, FoundRecord, MetadataRecord};

use super::convert::to_db_count;
use super::errors::Result;

/// Row counts of both record tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub found: u64,
    pub does_not_exist: u64,
    pub no_marker_files: u64,
}

impl StoreCounts {
    pub fn filtered(&self) -> u64 {
        self.does_not_exist + self.no_marker_files
    }

    pub fn total(&self) -> u64 {
        self.found + self.filtered()
    }
}

/// Stored record of `repo`, from whichever table holds it.
pub async fn find(db: &DatabaseConnection, repo: &RepoId) -> Result<Option<MetadataRecord>> {
    let key = repo.key();
    if let Some(model) = FoundRepository::find_by_id(key.clone()).one(db).await? {
        return Ok(Some(MetadataRecord::Found(Box::new(model.try_into()?))));
    }
    Ok(FilteredRepository::find_by_id(key)
        .one(db)
        .await?
        .map(|model| MetadataRecord::Filtered(model.into())))
}

/// Found records with at least `min_stars` stars, most starred first.
pub async fn find_found_with_min_stars(
    db: &DatabaseConnection,
    min_stars: u64,
) -> Result<Vec<FoundRecord>> {
    FoundRepository::find()
        .filter(FoundColumn::Stars.gte(to_db_count(min_stars)))
        .order_by_desc(FoundColumn::Stars)
        .order_by_asc(FoundColumn::Key)
        .all(db)
        .await?
        .into_iter()
        .map(FoundRecord::try_from)
        .collect()
}

/// Filtered records with `reason`, ordered by key.
pub async fn find_filtered_by_reason(
    db: &DatabaseConnection,
    reason: FilterReason,
) -> Result<Vec<FilteredRecord>> {
    Ok(FilteredRepository::find()
        .filter(FilteredColumn::Reason.eq(reason))
        .order_by_asc(FilteredColumn::Key)
        .all(db)
        .await?
        .into_iter()
        .map(FilteredRecord::from)
        .collect())
}

pub async fn counts(db: &DatabaseConnection) -> Result<StoreCounts> {
    let found = FoundRepository::find().count(db).await?;
    let does_not_exist = FilteredRepository::find()
        .filter(FilteredColumn::Reason.eq(FilterReason::DoesNotExist))
        .count(db)
        .await?;
    let no_marker_files = FilteredRepository::find()
        .filter(FilteredColumn::Reason.eq(FilterReason::NoMarkerFiles))
        .count(db)
        .await?;

    Ok(StoreCounts {
        found,
        does_not_exist,
        no_marker_files,
    })
}
