//! Gleaner CLI - harvests metadata about GitHub repositories.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::limits::OutputFormat;

#[derive(Parser)]
#[command(name = "gleaner")]
#[command(version)]
#[command(about = "Harvest metadata about GitHub repositories that use a technology")]
#[command(
    long_about = "Gleaner finds repositories through GitHub code search (splitting the \
search into date windows to get past the 1000 result cap) or through a curated \
seed list, checks them for marker files, and records their metadata once in a \
local database. Rate limits are waited out, never treated as failures."
)]
#[command(after_long_help = r#"EXAMPLES
    Harvest everything the configured search finds:
        $ gleaner search

    Try the first 20 search results:
        $ gleaner search --limit 20

    Harvest the entries of an awesome list:
        $ gleaner seeds README.md

    Collect a few repositories by hand:
        $ gleaner collect nf-core/rnaseq https://github.com/nf-core/sarek

    Mirror popular repositories to Airtable:
        $ gleaner export --min-stars 5

CONFIGURATION
    Gleaner reads configuration from:
      1. ~/.config/gleaner/config.toml (or $XDG_CONFIG_HOME/gleaner/config.toml)
      2. ./gleaner.toml
      3. Environment variables (GLEANER_* prefix, `__` between sections)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    GLEANER_DATABASE__URL       Database connection string (default: ~/.local/state/gleaner/gleaner.db)
    GLEANER_GITHUB__TOKEN       GitHub personal access token (or GITHUB_TOKEN)
    GLEANER_HARVEST__BASE_QUERY Search query every window is added to
    GLEANER_EXPORT__BASE_ID     Airtable base id
    GLEANER_EXPORT__API_KEY     Airtable token (or AIRTABLE_API_KEY)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enumerate the search space and collect every result
    Search {
        /// Stop after this many repositories
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Collect the `* [name](url)` entries of a Markdown seed list
    Seeds {
        /// Markdown document; entries after the "Tutorials" line are ignored
        file: PathBuf,

        /// Record repositories without marker files as filtered
        #[arg(short = 'm', long)]
        require_markers: bool,

        /// Stop after this many repositories
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Collect repositories given as owner/name or URL
    Collect {
        #[arg(required = true)]
        repos: Vec<String>,

        /// Record repositories without marker files as filtered
        #[arg(short = 'm', long)]
        require_markers: bool,

        /// Don't look at or save READMEs
        #[arg(long)]
        no_readme: bool,
    },
    /// Print the stored record of a repository as JSON
    Show {
        /// owner/name or URL
        repo: String,
    },
    /// Count stored records by status
    Stats {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Export found repositories to Airtable
    Export {
        /// Minimum stars (default from config or 2)
        #[arg(short = 's', long)]
        min_stars: Option<u64>,

        /// Show what would be exported without calling Airtable
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Show current GitHub rate limit status
    Limits {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub(crate) enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    shutdown::setup_shutdown_handler();

    // Structured logging only when not attached to a terminal; the terminal
    // gets progress bars instead.
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("gleaner=info,gleaner_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        commands::meta::handle_completions(*shell)?;
        return Ok(());
    }
    if let Commands::Limits { output } = &cli.command {
        commands::limits::handle_limits(*output, &config).await?;
        return Ok(());
    }

    let database_url = config
        .database_url()
        .ok_or("Could not determine a database location; set database.url")?;
    prepare_sqlite_dir(&database_url)?;

    match cli.command {
        Commands::Search { limit } => {
            commands::harvest::handle_search(limit, &config, &database_url).await?;
        }
        Commands::Seeds {
            file,
            require_markers,
            limit,
        } => {
            commands::harvest::handle_seeds(&file, require_markers, limit, &config, &database_url)
                .await?;
        }
        Commands::Collect {
            repos,
            require_markers,
            no_readme,
        } => {
            commands::harvest::handle_collect(
                &repos,
                require_markers,
                no_readme,
                &config,
                &database_url,
            )
            .await?;
        }
        Commands::Show { repo } => {
            commands::records::handle_show(&repo, &database_url).await?;
        }
        Commands::Stats { output } => {
            commands::records::handle_stats(output, &database_url).await?;
        }
        Commands::Export { min_stars, dry_run } => {
            commands::export::handle_export(min_stars, dry_run, &config, &database_url).await?;
        }
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Completions { .. } | Commands::Limits { .. } => {}
    }

    Ok(())
}

/// Create the parent directory of an SQLite database file.
fn prepare_sqlite_dir(database_url: &str) -> std::io::Result<()> {
    let Some(db_path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    // Strip query parameters (e.g., ?mode=rwc) before path operations
    let db_path = db_path.split('?').next().unwrap_or(db_path);
    let db_path = std::path::Path::new(db_path);

    if db_path.is_relative() && !db_path.as_os_str().is_empty() {
        tracing::warn!(
            "Database path '{}' is relative - behavior depends on current directory. \
             Consider using an absolute path.",
            db_path.display()
        );
    }

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
