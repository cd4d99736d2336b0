//! Persistence of harvested records.
//!
//! Found and filtered repositories live in separate tables keyed by the
//! lowercased `owner/name`. Writes go through [`IncrementalStore`], reads
//! through the query functions.

mod convert;
mod errors;
mod query;
mod store;

pub use errors::{Result, StoreError};
pub use query::{StoreCounts, counts, find, find_filtered_by_reason, find_found_with_min_stars};
pub use store::IncrementalStore;

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn store_error_database_from_db_err() {
        let err: StoreError = DbErr::RecordNotFound("test".to_string()).into();
        assert!(err.to_string().contains("Database error"));
    }

    #[test]
    fn store_error_serialization_names_column() {
        let json_err = serde_json::from_str::<Vec<String>>("{").unwrap_err();
        let err = StoreError::serialization("topics", json_err);
        let msg = err.to_string();
        assert!(msg.contains("Serialization error"));
        assert!(msg.contains("topics"));
    }

    #[test]
    fn store_error_invalid_input() {
        let err = StoreError::InvalidInput {
            message: "empty key".to_string(),
        };
        assert!(err.to_string().contains("Invalid input: empty key"));
    }
}
