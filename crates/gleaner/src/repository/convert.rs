//! Conversions between records and table rows.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;

use crate::entity::filtered_repository::{
    ActiveModel as FilteredActiveModel, Model as FilteredModel,
};
use crate::entity::found_repository::{ActiveModel as FoundActiveModel, Model as FoundModel};
use crate::platform::{ReleaseInfo, RepoId};
use crate::record::{FilteredRecord, FoundRecord, ReadmeInfo, StateCounts};

use super::errors::{Result, StoreError};

pub(crate) fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn to_db_time(value: Option<DateTime<Utc>>) -> Option<DateTime<FixedOffset>> {
    value.map(|t| t.fixed_offset())
}

fn from_db_time(value: Option<DateTime<FixedOffset>>) -> Option<DateTime<Utc>> {
    value.map(|t| t.with_timezone(&Utc))
}

pub(crate) fn found_active_model(
    record: &FoundRecord,
    recorded_at: DateTime<Utc>,
) -> Result<FoundActiveModel> {
    let topics = serde_json::to_value(&record.topics)
        .map_err(|e| StoreError::serialization("topics", e))?;
    let languages = serde_json::to_value(&record.languages)
        .map_err(|e| StoreError::serialization("languages", e))?;
    let probe = serde_json::to_value(&record.probe)
        .map_err(|e| StoreError::serialization("probe", e))?;
    let release = record.latest_release.as_ref();
    let readme = record.readme.as_ref();

    Ok(FoundActiveModel {
        key: Set(record.id.key()),
        owner: Set(record.id.owner.clone()),
        name: Set(record.id.name.clone()),
        url: Set(record.url.clone()),
        description: Set(record.description.clone()),
        homepage: Set(record.homepage.clone()),
        topics: Set(topics),
        parent: Set(record.parent.clone()),
        stars: Set(to_db_count(record.stars)),
        watchers: Set(to_db_count(record.watchers)),
        forks: Set(to_db_count(record.forks)),
        open_issues: Set(to_db_count(record.issues.open)),
        closed_issues: Set(to_db_count(record.issues.closed)),
        open_pulls: Set(to_db_count(record.pulls.open)),
        closed_pulls: Set(to_db_count(record.pulls.closed)),
        releases: Set(to_db_count(record.releases)),
        contributors: Set(to_db_count(record.contributors)),
        created_at: Set(to_db_time(record.created_at)),
        updated_at: Set(to_db_time(record.updated_at)),
        last_commit_at: Set(to_db_time(record.last_commit_at)),
        latest_release_name: Set(release.and_then(|r| r.name.clone())),
        latest_release_tag: Set(release.map(|r| r.tag_name.clone())),
        latest_release_at: Set(to_db_time(release.and_then(|r| r.created_at))),
        primary_language: Set(record.primary_language.clone()),
        languages: Set(languages),
        target_language_bytes: Set(to_db_count(record.target_language_bytes)),
        is_target_language: Set(record.is_target_language),
        probe: Set(probe),
        readme_file: Set(readme.map(|r| r.file_name.clone())),
        readme_mentions_keyword: Set(readme.and_then(|r| r.mentions_keyword)),
        recorded_at: Set(recorded_at.fixed_offset()),
    })
}

pub(crate) fn filtered_active_model(
    record: &FilteredRecord,
    recorded_at: DateTime<Utc>,
) -> FilteredActiveModel {
    FilteredActiveModel {
        key: Set(record.id.key()),
        owner: Set(record.id.owner.clone()),
        name: Set(record.id.name.clone()),
        exists: Set(record.exists),
        reason: Set(record.reason),
        recorded_at: Set(recorded_at.fixed_offset()),
    }
}

impl TryFrom<FoundModel> for FoundRecord {
    type Error = StoreError;

    fn try_from(model: FoundModel) -> Result<Self> {
        let topics = serde_json::from_value(model.topics)
            .map_err(|e| StoreError::serialization("topics", e))?;
        let languages = serde_json::from_value(model.languages)
            .map_err(|e| StoreError::serialization("languages", e))?;
        let probe = serde_json::from_value(model.probe)
            .map_err(|e| StoreError::serialization("probe", e))?;

        let latest_release = model.latest_release_tag.map(|tag_name| ReleaseInfo {
            name: model.latest_release_name,
            tag_name,
            created_at: from_db_time(model.latest_release_at),
        });
        let readme = model.readme_file.map(|file_name| ReadmeInfo {
            file_name,
            mentions_keyword: model.readme_mentions_keyword,
        });

        Ok(FoundRecord {
            id: RepoId::new(model.owner, model.name),
            url: model.url,
            description: model.description,
            homepage: model.homepage,
            created_at: from_db_time(model.created_at),
            updated_at: from_db_time(model.updated_at),
            topics,
            stars: from_db_count(model.stars),
            watchers: from_db_count(model.watchers),
            forks: from_db_count(model.forks),
            issues: StateCounts {
                open: from_db_count(model.open_issues),
                closed: from_db_count(model.closed_issues),
            },
            pulls: StateCounts {
                open: from_db_count(model.open_pulls),
                closed: from_db_count(model.closed_pulls),
            },
            releases: from_db_count(model.releases),
            contributors: from_db_count(model.contributors),
            last_commit_at: from_db_time(model.last_commit_at),
            latest_release,
            parent: model.parent,
            primary_language: model.primary_language,
            languages,
            target_language_bytes: from_db_count(model.target_language_bytes),
            is_target_language: model.is_target_language,
            probe,
            readme,
        })
    }
}

impl From<FilteredModel> for FilteredRecord {
    fn from(model: FilteredModel) -> Self {
        Self {
            id: RepoId::new(model.owner, model.name),
            exists: model.exists,
            reason: model.reason,
        }
    }
}
