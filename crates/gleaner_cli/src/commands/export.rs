//! `export`: mirror found repositories to Airtable.

use gleaner::export::{AirtableConfig, AirtableExporter};
use gleaner::repository;

use crate::commands::shared::open_store;
use crate::config::{Config, ExportConfig};

#[derive(Debug, Clone, tabled::Tabled)]
struct PreviewRow {
    #[tabled(rename = "Repository")]
    repository: String,
    #[tabled(rename = "Stars")]
    stars: u64,
}

fn airtable_config(export: &ExportConfig) -> Result<AirtableConfig, String> {
    let base_id = export
        .base_id
        .clone()
        .ok_or("No Airtable base configured (export.base_id or GLEANER_EXPORT__BASE_ID)")?;
    let api_key = export
        .api_key
        .clone()
        .ok_or("No Airtable API key configured (export.api_key or AIRTABLE_API_KEY)")?;

    Ok(AirtableConfig {
        table_name: export.table.clone(),
        ..AirtableConfig::new(base_id, api_key)
    })
}

pub(crate) async fn handle_export(
    min_stars: Option<u64>,
    dry_run: bool,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let min_stars = min_stars.unwrap_or(config.export.min_stars);
    let db = open_store(database_url).await?;
    let records = repository::find_found_with_min_stars(&db, min_stars).await?;

    if dry_run {
        let rows: Vec<PreviewRow> = records
            .iter()
            .map(|r| PreviewRow {
                repository: r.id.full_name(),
                stars: r.stars,
            })
            .collect();
        println!(
            "Would export {} repositories with at least {} stars to '{}':",
            rows.len(),
            min_stars,
            config.export.table
        );
        let mut table = tabled::Table::new(rows);
        table.with(tabled::settings::Style::rounded());
        println!("{}", table);
        return Ok(());
    }

    let exporter = AirtableExporter::new(airtable_config(&config.export)?)?;
    let summary = exporter.export(&records).await?;

    if summary.table_created {
        println!("Created table '{}'", exporter.config().table_name);
    }
    println!(
        "Exported {} repositories in {} batches",
        summary.records_created, summary.batches
    );
    Ok(())
}
