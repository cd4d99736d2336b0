//! SeaORM entity definitions for the gleaner database schema.

pub mod filter_reason;
pub mod filtered_repository;
pub mod found_repository;
pub mod prelude;
