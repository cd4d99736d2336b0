//! Configuration file support for gleaner.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `GLEANER_`, nested keys separated
//!    by `__`, e.g. `GLEANER_HARVEST__BASE_QUERY`)
//! 3. Config file (~/.config/gleaner/config.toml or ./gleaner.toml)
//! 4. Built-in defaults
//!
//! `GITHUB_TOKEN` and `AIRTABLE_API_KEY` are honored when no token is
//! configured otherwise.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/gleaner/gleaner.db"  # optional, this is the default
//!
//! [github]
//! token = "ghp_..."
//!
//! [harvest]
//! base_query = "nextflow in:readme archived:false"
//! epoch_year = 2015
//! exclude = ["nextflow-io", "nf-core/tools"]
//! marker_suffix = ".nf"
//! keyword = "nextflow"
//! target_language = "Nextflow"
//! readme_dir = "readmes"
//!
//! [export]
//! base_id = "app..."
//! api_key = "pat..."
//! table = "Repositories"
//! min_stars = 2
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use gleaner::harvest::{
    CollectorConfig, DEFAULT_BASE_QUERY, DEFAULT_EXCLUDED, DEFAULT_FIRST_YEAR, DEFAULT_KEYWORD,
    DEFAULT_MARKER_SUFFIX, DEFAULT_TARGET_LANGUAGE, DEFAULT_WELL_KNOWN_FILES, ExclusionList,
    MarkerPredicate, ProbeConfig, SEARCH_PAGE_SIZE, SEARCH_RESULT_CAP, SearchOptions,
};
use gleaner::retry::SAFETY_MARGIN;
use serde::Deserialize;

const APP_NAME: &str = "gleaner";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
    pub harvest: HarvestConfig,
    pub export: ExportConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: Option<String>,
}

/// Search and collection settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub base_query: String,
    /// First year searched.
    pub epoch_year: i32,
    /// Last year searched, the current year when unset.
    pub last_year: Option<i32>,
    pub cap: u64,
    /// Owners or `owner/name` pairs dropped from search results.
    pub exclude: Vec<String>,
    pub marker_suffix: String,
    pub marker_names: Vec<String>,
    pub well_known_files: Vec<String>,
    pub content_markers: Vec<String>,
    pub keyword: String,
    pub target_language: String,
    pub readme_dir: Option<PathBuf>,
    pub safety_margin_secs: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_query: DEFAULT_BASE_QUERY.to_string(),
            epoch_year: DEFAULT_FIRST_YEAR,
            last_year: None,
            cap: SEARCH_RESULT_CAP,
            exclude: DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect(),
            marker_suffix: DEFAULT_MARKER_SUFFIX.to_string(),
            marker_names: Vec::new(),
            well_known_files: DEFAULT_WELL_KNOWN_FILES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            content_markers: Vec::new(),
            keyword: DEFAULT_KEYWORD.to_string(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            readme_dir: None,
            safety_margin_secs: SAFETY_MARGIN.as_secs(),
        }
    }
}

impl HarvestConfig {
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            base_query: self.base_query.clone(),
            first_year: self.epoch_year,
            last_year: self.last_year,
            cap: self.cap,
            per_page: SEARCH_PAGE_SIZE,
            exclude: ExclusionList::new(&self.exclude),
        }
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            probe: ProbeConfig {
                marker: MarkerPredicate {
                    suffixes: vec![self.marker_suffix.clone()],
                    names: self.marker_names.clone(),
                },
                well_known: self.well_known_files.clone(),
                content_markers: self.content_markers.clone(),
            },
            keyword: self.keyword.clone(),
            target_language: self.target_language.clone(),
            readme_dir: self.readme_dir.clone(),
        }
    }

    pub fn safety_margin(&self) -> Duration {
        Duration::from_secs(self.safety_margin_secs)
    }
}

/// Airtable export settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub base_id: Option<String>,
    pub api_key: Option<String>,
    pub table: String,
    /// Only repositories with at least this many stars are exported.
    pub min_stars: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_id: None,
            api_key: None,
            table: gleaner::export::DEFAULT_TABLE_NAME.to_string(),
            min_stars: 2,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/gleaner/config.toml)
    /// 3. Local config file (./gleaner.toml)
    /// 4. Environment variables with GLEANER_ prefix
    /// 5. Conventional token variables, when nothing else set a token
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("gleaner.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./gleaner.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(Self::environment());

        let mut config = match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        };

        config.apply_token_fallbacks(
            std::env::var("GITHUB_TOKEN").ok(),
            std::env::var("AIRTABLE_API_KEY").ok(),
        );
        config
    }

    /// `GLEANER_HARVEST__BASE_QUERY` -> `harvest.base_query`.
    fn environment() -> Environment {
        Environment::with_prefix("GLEANER")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("harvest.exclude")
            .with_list_parse_key("harvest.marker_names")
            .with_list_parse_key("harvest.content_markers")
            .try_parsing(true)
    }

    fn apply_token_fallbacks(&mut self, github: Option<String>, airtable: Option<String>) {
        if self.github.token.is_none() {
            self.github.token = github.filter(|t| !t.trim().is_empty());
        }
        if self.export.api_key.is_none() {
            self.export.api_key = airtable.filter(|t| !t.trim().is_empty());
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir()
                .map(|state_dir| gleaner::sqlite_url(&state_dir.join("gleaner.db")))
        })
    }

    pub fn github_token(&self) -> Option<&str> {
        self.github.token.as_deref()
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/gleaner` or `~/.local/state/gleaner`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_content: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert!(config.github.token.is_none());
        assert_eq!(config.harvest.base_query, DEFAULT_BASE_QUERY);
        assert_eq!(config.harvest.epoch_year, 2015);
        assert_eq!(config.harvest.cap, 1000);
        assert_eq!(config.harvest.safety_margin_secs, 5);
        assert_eq!(config.export.min_stars, 2);
        assert_eq!(config.export.table, "Repositories");
    }

    #[test]
    fn test_full_config_parsing() {
        let config = parse(
            r#"
            [database]
            url = "sqlite:///tmp/test.db"

            [github]
            token = "ghp_test123"

            [harvest]
            base_query = "snakemake in:readme"
            epoch_year = 2018
            last_year = 2020
            exclude = ["snakemake"]
            marker_suffix = ".smk"
            marker_names = ["Snakefile"]
            keyword = "snakemake"
            target_language = "Python"
            readme_dir = "/tmp/readmes"
            safety_margin_secs = 1

            [export]
            base_id = "appXYZ"
            api_key = "pat_abc"
            min_stars = 10
        "#,
        );

        assert_eq!(config.database.url.as_deref(), Some("sqlite:///tmp/test.db"));
        assert_eq!(config.github_token(), Some("ghp_test123"));
        assert_eq!(config.harvest.last_year, Some(2020));
        assert_eq!(config.harvest.safety_margin(), Duration::from_secs(1));
        assert_eq!(config.export.base_id.as_deref(), Some("appXYZ"));
        assert_eq!(config.export.min_stars, 10);
        // Unset fields keep their defaults.
        assert_eq!(config.export.table, "Repositories");
    }

    #[test]
    fn test_harvest_config_builds_engine_options() {
        let config = parse(
            r#"
            [harvest]
            epoch_year = 2019
            exclude = ["someone", "other/repo"]
            marker_suffix = ".smk"
            marker_names = ["Snakefile"]
        "#,
        );

        let search = config.harvest.search_options();
        assert_eq!(search.first_year, 2019);
        assert_eq!(search.exclude.len(), 2);

        let collector = config.harvest.collector_config();
        assert!(collector.probe.marker.matches("rules.smk"));
        assert!(collector.probe.marker.matches("Snakefile"));
        assert!(!collector.probe.marker.matches("main.nf"));
    }

    #[test]
    fn test_token_fallbacks_only_fill_gaps() {
        let mut config = parse(
            r#"
            [github]
            token = "from-config"
        "#,
        );
        config.apply_token_fallbacks(Some("from-env".to_string()), Some("pat_env".to_string()));

        assert_eq!(config.github_token(), Some("from-config"));
        assert_eq!(config.export.api_key.as_deref(), Some("pat_env"));

        let mut config = Config::default();
        config.apply_token_fallbacks(Some("  ".to_string()), None);
        assert!(config.github_token().is_none());
    }

    #[test]
    fn test_database_url_defaults_to_state_dir() {
        let url = Config::default().database_url().unwrap();
        assert!(url.starts_with("sqlite://"));
        assert!(url.contains("gleaner.db"));
        assert!(url.ends_with("?mode=rwc"));
    }

    #[test]
    fn test_database_url_respects_configured_value() {
        let config = parse(
            r#"
            [database]
            url = "postgres://localhost/gleaner"
        "#,
        );
        assert_eq!(
            config.database_url(),
            Some("postgres://localhost/gleaner".to_string())
        );
    }

    #[test]
    fn test_config_invalid_toml() {
        let result = ConfigBuilder::builder()
            .add_source(config::File::from_str("[harvest\ncap = 1", FileFormat::Toml))
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_config_unknown_fields_ignored() {
        let config = parse(
            r#"
            [harvest]
            cap = 500
            unknown_field = "should be ignored"
        "#,
        );
        assert_eq!(config.harvest.cap, 500);
    }
}
