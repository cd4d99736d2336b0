//! Common re-exports for convenient entity usage.

pub use super::filter_reason::FilterReason;
pub use super::filtered_repository::{
    ActiveModel as FilteredRepositoryActiveModel, Column as FilteredRepositoryColumn,
    Entity as FilteredRepository, Model as FilteredRepositoryModel,
};
pub use super::found_repository::{
    ActiveModel as FoundRepositoryActiveModel, Column as FoundRepositoryColumn,
    Entity as FoundRepository, Model as FoundRepositoryModel,
};
