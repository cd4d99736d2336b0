//! Repositories that passed the relevance check, with their full metadata.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "found_repositories")]
pub struct Model {
    /// Lowercased `owner/name`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,

    // ─── Naming ──────────────────────────────────────────────────────────────
    pub owner: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub url: String,

    // ─── Content ─────────────────────────────────────────────────────────────
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub homepage: Option<String>,
    /// JSON array of topic names.
    #[sea_orm(column_type = "Json")]
    pub topics: serde_json::Value,
    /// Fork parent as `owner/name`.
    pub parent: Option<String>,

    // ─── Statistics ──────────────────────────────────────────────────────────
    pub stars: i64,
    pub watchers: i64,
    pub forks: i64,
    pub open_issues: i64,
    pub closed_issues: i64,
    pub open_pulls: i64,
    pub closed_pulls: i64,
    pub releases: i64,
    pub contributors: i64,

    // ─── Activity ────────────────────────────────────────────────────────────
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub last_commit_at: Option<DateTimeWithTimeZone>,
    pub latest_release_name: Option<String>,
    pub latest_release_tag: Option<String>,
    pub latest_release_at: Option<DateTimeWithTimeZone>,

    // ─── Languages ───────────────────────────────────────────────────────────
    pub primary_language: Option<String>,
    /// JSON array of `{language, bytes, percent}` objects.
    #[sea_orm(column_type = "Json")]
    pub languages: serde_json::Value,
    pub target_language_bytes: i64,
    pub is_target_language: bool,

    // ─── Relevance ───────────────────────────────────────────────────────────
    /// Serialized probe result.
    #[sea_orm(column_type = "Json")]
    pub probe: serde_json::Value,
    pub readme_file: Option<String>,
    pub readme_mentions_keyword: Option<bool>,

    /// When the record was written.
    pub recorded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}
