//! Assembling one metadata record per repository.

use std::path::Path;

use crate::platform::{BudgetCategory, ContentEntry, IssueState, RepoDetails, RepoId};
use crate::record::{
    FilterReason, FilteredRecord, FoundRecord, LanguageShare, MetadataRecord, ProbeResult,
    ReadmeInfo, StateCounts,
};
use crate::retry::RateLimitGuard;

use super::errors::CollectError;
use super::probe::FileTreeProber;
use super::types::{CollectOptions, CollectorConfig};

/// File name tried before any other README candidate.
const PREFERRED_README: &str = "README.md";

/// Issues the bounded sequence of calls that turns an identifier into a
/// [`MetadataRecord`].
pub struct MetadataCollector<'a> {
    guard: &'a RateLimitGuard,
    config: CollectorConfig,
}

impl<'a> MetadataCollector<'a> {
    pub fn new(guard: &'a RateLimitGuard, config: CollectorConfig) -> Self {
        Self { guard, config }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Collect `repo`.
    ///
    /// A missing repository and (with `require_marker_files`) a repository
    /// without marker files are ordinary outcomes, returned as
    /// [`MetadataRecord::Filtered`]. Every other failure aborts the
    /// repository. Does not consult any store.
    pub async fn collect(
        &self,
        repo: &RepoId,
        options: CollectOptions,
    ) -> Result<MetadataRecord, CollectError> {
        let details = match self
            .guard
            .invoke(BudgetCategory::Core, |api| api.get_repo(repo))
            .await
        {
            Ok(details) => details,
            Err(e) if e.is_not_found() => {
                tracing::debug!(repo = %repo, "Repository does not exist");
                return Ok(MetadataRecord::Filtered(FilteredRecord::new(
                    repo.clone(),
                    FilterReason::DoesNotExist,
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let prober = FileTreeProber::new(self.guard, &self.config.probe);
        let (probe, root) = prober
            .probe_with_root(repo, &self.config.probe.marker)
            .await?;

        if options.require_marker_files && !probe.any_match() {
            tracing::debug!(repo = %repo, "No marker files found");
            return Ok(MetadataRecord::Filtered(FilteredRecord::new(
                repo.clone(),
                FilterReason::NoMarkerFiles,
            )));
        }

        let found = self.extract(repo, details, probe, &root, options).await?;
        Ok(MetadataRecord::Found(Box::new(found)))
    }

    async fn extract(
        &self,
        repo: &RepoId,
        details: RepoDetails,
        probe: ProbeResult,
        root: &[ContentEntry],
        options: CollectOptions,
    ) -> Result<FoundRecord, CollectError> {
        let core = BudgetCategory::Core;
        let guard = self.guard;

        let topics = guard.invoke(core, |api| api.list_topics(repo)).await?;
        let last_commit_at = guard
            .invoke(core, |api| api.latest_commit_date(repo))
            .await?;

        let releases = guard.invoke(core, |api| api.count_releases(repo)).await?;
        let latest_release = if releases > 0 {
            guard.invoke(core, |api| api.latest_release(repo)).await?
        } else {
            None
        };

        let issues = StateCounts {
            open: guard
                .invoke(core, |api| api.count_issues(repo, IssueState::Open))
                .await?,
            closed: guard
                .invoke(core, |api| api.count_issues(repo, IssueState::Closed))
                .await?,
        };
        let pulls = StateCounts {
            open: guard
                .invoke(core, |api| api.count_pulls(repo, IssueState::Open))
                .await?,
            closed: guard
                .invoke(core, |api| api.count_pulls(repo, IssueState::Closed))
                .await?,
        };
        let contributors = guard
            .invoke(core, |api| api.count_contributors(repo))
            .await?;

        let language_bytes = guard.invoke(core, |api| api.list_languages(repo)).await?;
        let target = self.config.target_language.as_str();
        let target_language_bytes = language_bytes
            .iter()
            .find(|(language, _)| language == target)
            .map(|(_, bytes)| *bytes)
            .unwrap_or(0);
        let is_target_language = details.language.as_deref() == Some(target);

        let readme = if options.save_readme {
            self.readme(repo, root).await?
        } else {
            None
        };

        Ok(FoundRecord {
            id: repo.clone(),
            url: details.html_url,
            description: details.description,
            homepage: details.homepage,
            created_at: details.created_at,
            updated_at: details.updated_at,
            topics,
            stars: details.stars,
            watchers: details.watchers,
            forks: details.forks,
            issues,
            pulls,
            releases,
            contributors,
            last_commit_at,
            latest_release,
            parent: details.parent,
            primary_language: details.language,
            languages: LanguageShare::from_bytes(&language_bytes),
            target_language_bytes,
            is_target_language,
            probe,
            readme,
        })
    }

    /// Fetch the README, check it for the keyword and save it when a README
    /// directory is configured. Undecodable READMEs are neither checked nor
    /// saved.
    async fn readme(
        &self,
        repo: &RepoId,
        root: &[ContentEntry],
    ) -> Result<Option<ReadmeInfo>, CollectError> {
        let Some(entry) = find_readme(root) else {
            tracing::debug!(repo = %repo, "No README in repository root");
            return Ok(None);
        };

        let bytes = self
            .guard
            .invoke(BudgetCategory::Core, |api| api.get_file(repo, &entry.path))
            .await?;

        let mentions_keyword = match std::str::from_utf8(&bytes) {
            Ok(text) => {
                if let Some(dir) = &self.config.readme_dir {
                    save_readme(dir, repo, &entry.name, text).await;
                }
                Some(
                    text.to_lowercase()
                        .contains(&self.config.keyword.to_lowercase()),
                )
            }
            Err(e) => {
                tracing::warn!(repo = %repo, file = %entry.name, error = %e, "Could not decode README");
                None
            }
        };

        Ok(Some(ReadmeInfo {
            file_name: entry.name.clone(),
            mentions_keyword,
        }))
    }
}

/// `README.md` if present, otherwise the first root file named `README`
/// (any case) with any extension.
fn find_readme(root: &[ContentEntry]) -> Option<&ContentEntry> {
    let files = || root.iter().filter(|e| e.is_file());
    files().find(|e| e.name == PREFERRED_README).or_else(|| {
        files().find(|e| {
            Path::new(&e.name)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| stem.eq_ignore_ascii_case("README"))
        })
    })
}

/// Write to `<dir>/<name>--<owner>/<file_name>`. Failures are logged only.
async fn save_readme(dir: &Path, repo: &RepoId, file_name: &str, text: &str) {
    let target = dir.join(format!("{}--{}", repo.name, repo.owner));
    let result = match tokio::fs::create_dir_all(&target).await {
        Ok(()) => tokio::fs::write(target.join(file_name), text).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => tracing::debug!(repo = %repo, path = %target.display(), "Saved README"),
        Err(e) => tracing::warn!(
            repo = %repo,
            path = %target.display(),
            error = %e,
            "Could not save README"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::platform::{EntryKind, PlatformError, ReleaseInfo};
    use crate::testing::{FakePlatform, FakeRepo};

    const EXTRACTION_CALLS: &[&str] = &[
        "list_topics",
        "latest_commit_date",
        "count_releases",
        "latest_release",
        "count_issues",
        "count_pulls",
        "count_contributors",
        "list_languages",
    ];

    fn pipeline_repo() -> FakeRepo {
        FakeRepo::new("nf-core", "rnaseq")
            .description("RNA sequencing analysis pipeline")
            .language("Nextflow")
            .stars(900)
            .topics(&["nextflow", "rna-seq"])
            .languages(&[("Nextflow", 3000), ("Python", 1000)])
            .last_commit(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap())
            .releases(
                12,
                Some(ReleaseInfo {
                    name: Some("3.14.0".to_string()),
                    tag_name: "3.14.0".to_string(),
                    created_at: Some(Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap()),
                }),
            )
            .issues(40, 300)
            .pulls(5, 700)
            .contributors(150)
            .file("README.md", b"# nf-core/rnaseq\n\nA NextFlow pipeline.")
            .file("main.nf", b"workflow {}")
            .file("nextflow.config", b"")
    }

    #[tokio::test]
    async fn missing_repository_is_filtered_as_nonexistent() {
        let fake = Arc::new(FakePlatform::new());
        let guard = RateLimitGuard::new(fake.clone());
        let collector = MetadataCollector::new(&guard, CollectorConfig::default());

        let record = collector
            .collect(&RepoId::new("ghost", "repo"), CollectOptions::for_search())
            .await
            .unwrap();

        match record {
            MetadataRecord::Filtered(filtered) => {
                assert_eq!(filtered.reason, FilterReason::DoesNotExist);
                assert!(!filtered.exists);
            }
            other => panic!("expected filtered record, got {other:?}"),
        }
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn repository_without_markers_is_filtered_without_further_calls() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(
            FakeRepo::new("octocat", "Hello-World")
                .stars(2500)
                .file("README", b"Hello World!"),
        );
        let guard = RateLimitGuard::new(fake.clone());
        let collector = MetadataCollector::new(&guard, CollectorConfig::default());

        let record = collector
            .collect(
                &RepoId::new("octocat", "Hello-World"),
                CollectOptions::for_search(),
            )
            .await
            .unwrap();

        assert_eq!(record.filter_reason(), Some(FilterReason::NoMarkerFiles));
        for op in EXTRACTION_CALLS {
            assert_eq!(fake.call_count(op), 0, "{op} should not be called");
        }
        assert_eq!(fake.call_count("get_file"), 0);
    }

    #[tokio::test]
    async fn relevant_repository_yields_a_full_record() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(pipeline_repo());
        let guard = RateLimitGuard::new(fake.clone());
        let collector = MetadataCollector::new(&guard, CollectorConfig::default());

        let record = collector
            .collect(&RepoId::new("nf-core", "rnaseq"), CollectOptions::for_search())
            .await
            .unwrap();

        let MetadataRecord::Found(found) = record else {
            panic!("expected found record");
        };
        assert_eq!(found.url, "https://github.com/nf-core/rnaseq");
        assert_eq!(found.display_name(), "rnaseq--nf-core");
        assert_eq!(found.stars, 900);
        assert_eq!(found.topics, vec!["nextflow", "rna-seq"]);
        assert_eq!(found.issues, StateCounts { open: 40, closed: 300 });
        assert_eq!(found.pulls.total(), 705);
        assert_eq!(found.releases, 12);
        assert_eq!(
            found.latest_release.as_ref().map(|r| r.tag_name.as_str()),
            Some("3.14.0")
        );
        assert_eq!(found.contributors, 150);
        assert_eq!(found.target_language_bytes, 3000);
        assert!(found.is_target_language);
        assert_eq!(found.languages[0].percent, 75.0);
        assert_eq!(found.probe.root_matches, vec!["main.nf"]);
        assert!(found.probe.has_well_known_root("nextflow.config"));
        assert_eq!(
            found.readme,
            Some(ReadmeInfo {
                file_name: "README.md".to_string(),
                mentions_keyword: Some(true),
            })
        );
    }

    #[tokio::test]
    async fn zero_releases_never_requests_the_latest_release() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(FakeRepo::new("someone", "fresh").file("main.nf", b""));
        let guard = RateLimitGuard::new(fake.clone());
        let collector = MetadataCollector::new(&guard, CollectorConfig::default());

        let record = collector
            .collect(&RepoId::new("someone", "fresh"), CollectOptions::for_search())
            .await
            .unwrap();

        let MetadataRecord::Found(found) = record else {
            panic!("expected found record");
        };
        assert_eq!(found.releases, 0);
        assert!(found.latest_release.is_none());
        assert_eq!(fake.call_count("latest_release"), 0);
        assert!(found.readme.is_none());
        assert!(!found.is_target_language);
    }

    #[tokio::test]
    async fn seed_list_mode_keeps_repositories_without_markers() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(FakeRepo::new("lab", "notes").file("README.rst", b"Nothing here"));
        let guard = RateLimitGuard::new(fake.clone());
        let collector = MetadataCollector::new(&guard, CollectorConfig::default());

        let record = collector
            .collect(&RepoId::new("lab", "notes"), CollectOptions::for_seed_list())
            .await
            .unwrap();

        let MetadataRecord::Found(found) = record else {
            panic!("expected found record");
        };
        assert!(!found.probe.any_match());
        let readme = found.readme.expect("README.rst should be picked up");
        assert_eq!(readme.file_name, "README.rst");
        assert_eq!(readme.mentions_keyword, Some(false));
    }

    #[tokio::test]
    async fn undecodable_readme_leaves_keyword_flag_unset() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(
            FakeRepo::new("binary", "readme")
                .file("main.nf", b"")
                .file("README.md", &[0xc3, 0x28, 0xa0]),
        );
        let guard = RateLimitGuard::new(fake.clone());
        let collector = MetadataCollector::new(&guard, CollectorConfig::default());

        let record = collector
            .collect(&RepoId::new("binary", "readme"), CollectOptions::for_search())
            .await
            .unwrap();

        let MetadataRecord::Found(found) = record else {
            panic!("expected found record");
        };
        assert_eq!(found.readme.map(|r| r.mentions_keyword), Some(None));
    }

    #[tokio::test]
    async fn readme_is_saved_under_owner_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(pipeline_repo());
        let guard = RateLimitGuard::new(fake.clone());
        let config = CollectorConfig {
            readme_dir: Some(dir.path().to_path_buf()),
            ..CollectorConfig::default()
        };
        let collector = MetadataCollector::new(&guard, config);

        collector
            .collect(&RepoId::new("nf-core", "rnaseq"), CollectOptions::for_search())
            .await
            .unwrap();

        let saved = std::fs::read_to_string(dir.path().join("rnaseq--nf-core").join("README.md"))
            .unwrap();
        assert!(saved.contains("NextFlow pipeline"));
    }

    #[tokio::test]
    async fn readme_is_skipped_when_not_requested() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(pipeline_repo());
        let guard = RateLimitGuard::new(fake.clone());
        let collector = MetadataCollector::new(&guard, CollectorConfig::default());
        let options = CollectOptions {
            save_readme: false,
            require_marker_files: true,
        };

        let record = collector
            .collect(&RepoId::new("nf-core", "rnaseq"), options)
            .await
            .unwrap();

        let MetadataRecord::Found(found) = record else {
            panic!("expected found record");
        };
        assert!(found.readme.is_none());
        assert_eq!(fake.call_count("get_file"), 0);
    }

    #[tokio::test]
    async fn other_errors_abort_the_repository() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(pipeline_repo());
        fake.fail_next("count_contributors", PlatformError::api(500, "boom"));
        let guard = RateLimitGuard::new(fake.clone());
        let collector = MetadataCollector::new(&guard, CollectorConfig::default());

        let err = collector
            .collect(&RepoId::new("nf-core", "rnaseq"), CollectOptions::for_search())
            .await
            .expect_err("contributor count failure should abort");

        assert!(matches!(
            err,
            CollectError::Api(PlatformError::Api { status: 500, .. })
        ));
        assert_eq!(fake.call_count("list_languages"), 0);
    }

    #[test]
    fn readme_md_wins_over_other_candidates() {
        let entry = |name: &str, kind| ContentEntry {
            name: name.to_string(),
            path: name.to_string(),
            kind,
        };
        let root = vec![
            entry("readme.txt", EntryKind::File),
            entry("README", EntryKind::Dir),
            entry("README.md", EntryKind::File),
        ];
        assert_eq!(find_readme(&root).map(|e| e.name.as_str()), Some("README.md"));

        let root = vec![
            entry("README", EntryKind::Dir),
            entry("readme.txt", EntryKind::File),
        ];
        assert_eq!(find_readme(&root).map(|e| e.name.as_str()), Some("readme.txt"));

        assert!(find_readme(&[entry("docs", EntryKind::Dir)]).is_none());
    }
}
