//! Mirroring harvested records to external services.

mod airtable;
mod error;

pub use airtable::{
    AIRTABLE_API_BASE, AirtableConfig, AirtableExporter, BATCH_SIZE, DEFAULT_TABLE_NAME,
    ExportSummary, FieldType, TABLE_FIELDS, format_languages, record_fields,
};
pub use error::{ExportError, Result};
