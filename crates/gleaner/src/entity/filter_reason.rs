//! Why a repository was recorded without metadata.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "kebab-case")]
pub enum FilterReason {
    /// The code host reports no such repository (deleted, renamed away, private).
    #[sea_orm(string_value = "does-not-exist")]
    DoesNotExist,
    /// Neither the root nor any first-level directory holds a marker file.
    #[sea_orm(string_value = "no-marker-files")]
    NoMarkerFiles,
}

impl FilterReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterReason::DoesNotExist => "does-not-exist",
            FilterReason::NoMarkerFiles => "no-marker-files",
        }
    }
}

impl std::fmt::Display for FilterReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
