//! Airtable export of found repositories.
//!
//! The target table is created with a fixed schema on first use. Records are
//! appended, never updated, in batches of [`BATCH_SIZE`] (the API maximum).

use std::sync::Arc;
use std::time::Duration as StdDuration;

use serde::Deserialize;
use serde_json::{Map, Value, json};
use url::Url;

use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpHeaders, HttpRequest, HttpResponse, HttpTransport};
use crate::record::{FoundRecord, LanguageShare};

use super::error::{ExportError, Result};

pub const AIRTABLE_API_BASE: &str = "https://api.airtable.com";
pub const DEFAULT_TABLE_NAME: &str = "Repositories";

/// Maximum records per create request.
pub const BATCH_SIZE: usize = 10;

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Column types used by the exported table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    LongText,
    Number,
    DateTime,
    Checkbox,
}

impl FieldType {
    /// Field definition for the table-creation request.
    fn definition(self, name: &str) -> Value {
        match self {
            FieldType::Text => json!({"name": name, "type": "singleLineText"}),
            FieldType::LongText => json!({"name": name, "type": "multilineText"}),
            FieldType::Number => json!({"name": name, "type": "number", "options": {"precision": 0}}),
            FieldType::DateTime => json!({
                "name": name,
                "type": "dateTime",
                "options": {
                    "timeZone": "utc",
                    "dateFormat": {"name": "friendly", "format": "LL"},
                    "timeFormat": {"name": "24hour", "format": "HH:mm"}
                }
            }),
            FieldType::Checkbox => json!({
                "name": name,
                "type": "checkbox",
                "options": {"color": "greenBright", "icon": "check"}
            }),
        }
    }
}

/// Columns of the exported table, in display order.
pub const TABLE_FIELDS: &[(&str, FieldType)] = &[
    ("URL", FieldType::Text),
    ("Title", FieldType::Text),
    ("Owner", FieldType::Text),
    ("Name", FieldType::Text),
    ("Description", FieldType::LongText),
    ("Website", FieldType::Text),
    ("Created at", FieldType::DateTime),
    ("Updated at", FieldType::DateTime),
    ("Topics", FieldType::Text),
    ("Stars", FieldType::Number),
    ("Watchers", FieldType::Number),
    ("Forks", FieldType::Number),
    ("Issues", FieldType::Number),
    ("Open issues", FieldType::Number),
    ("Closed issues", FieldType::Number),
    ("PRs", FieldType::Number),
    ("Open PRs", FieldType::Number),
    ("Closed PRs", FieldType::Number),
    ("Number of releases", FieldType::Number),
    ("Latest release", FieldType::Text),
    ("Latest release date", FieldType::DateTime),
    ("Contributors", FieldType::Number),
    ("Last commit", FieldType::DateTime),
    ("Head fork", FieldType::Text),
    ("Languages", FieldType::LongText),
    ("Main language", FieldType::Text),
    ("Target language is main", FieldType::Checkbox),
    ("Target language bytes", FieldType::Number),
    ("Marker files in root", FieldType::Text),
    ("Marker files in subfolders", FieldType::Text),
    ("Readme file name", FieldType::Text),
    ("Readme mentions keyword", FieldType::Checkbox),
];

/// `"Lang: 12.34%"` per language, one per line.
pub fn format_languages(languages: &[LanguageShare]) -> String {
    languages
        .iter()
        .map(|share| format!("{}: {:.2}%", share.language, share.percent))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Airtable `fields` object for one record. Absent values are omitted.
pub fn record_fields(record: &FoundRecord) -> Map<String, Value> {
    let mut fields = Map::new();
    let mut put = |name: &str, value: Value| {
        if !value.is_null() {
            fields.insert(name.to_string(), value);
        }
    };
    let date = |d: Option<chrono::DateTime<chrono::Utc>>| {
        d.map(|d| Value::String(d.to_rfc3339())).unwrap_or(Value::Null)
    };

    put("URL", json!(record.url));
    put("Title", json!(record.title()));
    put("Owner", json!(record.owner()));
    put("Name", json!(record.display_name()));
    put("Description", json!(record.description));
    put("Website", json!(record.homepage));
    put("Created at", date(record.created_at));
    put("Updated at", date(record.updated_at));
    put("Topics", json!(record.topics.join(", ")));
    put("Stars", json!(record.stars));
    put("Watchers", json!(record.watchers));
    put("Forks", json!(record.forks));
    put("Issues", json!(record.issues.total()));
    put("Open issues", json!(record.issues.open));
    put("Closed issues", json!(record.issues.closed));
    put("PRs", json!(record.pulls.total()));
    put("Open PRs", json!(record.pulls.open));
    put("Closed PRs", json!(record.pulls.closed));
    put("Number of releases", json!(record.releases));
    if let Some(release) = &record.latest_release {
        put(
            "Latest release",
            json!(release.name.as_deref().unwrap_or(release.tag_name.as_str())),
        );
        put("Latest release date", date(release.created_at));
    }
    put("Contributors", json!(record.contributors));
    put("Last commit", date(record.last_commit_at));
    put("Head fork", json!(record.parent));
    put("Languages", json!(format_languages(&record.languages)));
    put("Main language", json!(record.primary_language));
    put("Target language is main", json!(record.is_target_language));
    put("Target language bytes", json!(record.target_language_bytes));
    put("Marker files in root", json!(record.probe.root_matches.join(", ")));
    put(
        "Marker files in subfolders",
        json!(record.probe.nested_matches.join(", ")),
    );
    if let Some(readme) = &record.readme {
        put("Readme file name", json!(readme.file_name));
        put("Readme mentions keyword", json!(readme.mentions_keyword));
    }

    fields
}

/// Where and how to export.
#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_base: String,
    pub base_id: String,
    pub token: String,
    pub table_name: String,
}

impl AirtableConfig {
    pub fn new(base_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_base: AIRTABLE_API_BASE.to_string(),
            base_id: base_id.into(),
            token: token.into(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }
}

/// Result of one export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub table_created: bool,
    pub records_created: usize,
    pub batches: usize,
}

#[derive(Debug, Deserialize)]
struct TableList {
    tables: Vec<TableInfo>,
}

#[derive(Debug, Deserialize)]
struct TableInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedRecords {
    #[serde(default)]
    records: Vec<Value>,
}

pub struct AirtableExporter {
    transport: Arc<dyn HttpTransport>,
    config: AirtableConfig,
}

impl AirtableExporter {
    pub fn new(config: AirtableConfig) -> Result<Self> {
        if config.base_id.trim().is_empty() {
            return Err(ExportError::Config("Airtable base id is empty".to_string()));
        }
        if config.token.trim().is_empty() {
            return Err(ExportError::Config("Airtable token is empty".to_string()));
        }
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)?;
        Ok(Self::new_with_transport(config, Arc::new(transport)))
    }

    pub fn new_with_transport(config: AirtableConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &AirtableConfig {
        &self.config
    }

    /// Create the table unless the base already has one with the same name.
    ///
    /// Returns whether the table was created.
    pub async fn ensure_table(&self) -> Result<bool> {
        let url = self.endpoint(&["v0", "meta", "bases", self.config.base_id.as_str(), "tables"])?;
        let response = self
            .send(HttpRequest::get(url.as_str(), self.headers()))
            .await?;
        let list: TableList = serde_json::from_slice(&response.body)?;

        if list.tables.iter().any(|t| t.name == self.config.table_name) {
            return Ok(false);
        }

        let fields: Vec<Value> = TABLE_FIELDS
            .iter()
            .map(|(name, kind)| kind.definition(name))
            .collect();
        let body = json!({"name": self.config.table_name, "fields": fields});
        self.send(HttpRequest::post_json(
            url.as_str(),
            self.headers(),
            serde_json::to_vec(&body)?,
        ))
        .await?;

        tracing::info!(table = %self.config.table_name, "Created Airtable table");
        Ok(true)
    }

    /// Ensure the table exists, then append `records`.
    pub async fn export(&self, records: &[FoundRecord]) -> Result<ExportSummary> {
        let mut summary = ExportSummary {
            table_created: self.ensure_table().await?,
            ..ExportSummary::default()
        };

        for batch in records.chunks(BATCH_SIZE) {
            summary.records_created += self.create_batch(batch).await?;
            summary.batches += 1;
        }

        tracing::info!(
            table = %self.config.table_name,
            records = summary.records_created,
            batches = summary.batches,
            "Exported records to Airtable"
        );
        Ok(summary)
    }

    async fn create_batch(&self, batch: &[FoundRecord]) -> Result<usize> {
        let url = self.endpoint(&[
            "v0",
            self.config.base_id.as_str(),
            self.config.table_name.as_str(),
        ])?;
        let records: Vec<Value> = batch
            .iter()
            .map(|record| json!({"fields": record_fields(record)}))
            .collect();
        let body = json!({"records": records, "typecast": true});

        let response = self
            .send(HttpRequest::post_json(
                url.as_str(),
                self.headers(),
                serde_json::to_vec(&body)?,
            ))
            .await?;
        let created: CreatedRecords = serde_json::from_slice(&response.body)?;
        Ok(created.records.len())
    }

    fn headers(&self) -> HttpHeaders {
        vec![(
            "Authorization".to_string(),
            format!("Bearer {}", self.config.token),
        )]
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_base)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ExportError::Api {
                status: response.status,
                message: response.body_text(),
            })
        }
    }
}
