//! Repositories that were looked at and deliberately not harvested.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::filter_reason::FilterReason;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "filtered_repositories")]
pub struct Model {
    /// Lowercased `owner/name`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub owner: String,
    pub name: String,
    /// Whether the code host still knows the repository.
    pub exists: bool,
    pub reason: FilterReason,
    pub recorded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
