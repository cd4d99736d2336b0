//! `show` and `stats`.

use gleaner::RepoId;
use gleaner::repository::{self, StoreCounts};

use crate::commands::limits::OutputFormat;
use crate::commands::shared::open_store;

/// Print the stored record of one repository as JSON.
pub(crate) async fn handle_show(
    input: &str,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = RepoId::parse(input)?;
    let db = open_store(database_url).await?;

    match repository::find(&db, &repo).await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => return Err(format!("No record for {repo}").into()),
    }
    Ok(())
}

#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct CountRow {
    #[tabled(rename = "Status")]
    pub status: &'static str,
    #[tabled(rename = "Records")]
    pub records: u64,
}

pub(crate) fn count_rows(counts: &StoreCounts) -> Vec<CountRow> {
    vec![
        CountRow {
            status: "found",
            records: counts.found,
        },
        CountRow {
            status: "does-not-exist",
            records: counts.does_not_exist,
        },
        CountRow {
            status: "no-marker-files",
            records: counts.no_marker_files,
        },
        CountRow {
            status: "total",
            records: counts.total(),
        },
    ]
}

/// Print how many records of each kind the store holds.
pub(crate) async fn handle_stats(
    output: OutputFormat,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_store(database_url).await?;
    let rows = count_rows(&repository::counts(&db).await?);

    match output {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(rows);
            table.with(tabled::settings::Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }
    Ok(())
}
