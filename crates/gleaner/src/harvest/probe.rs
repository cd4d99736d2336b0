//! Shallow file-tree probe deciding whether a repository is relevant.

use crate::platform::{BudgetCategory, ContentEntry, RepoId, Result};
use crate::record::ProbeResult;
use crate::retry::RateLimitGuard;

use super::types::{MarkerPredicate, ProbeConfig};

/// Looks for marker files in the root and exactly one level below it.
pub struct FileTreeProber<'a> {
    guard: &'a RateLimitGuard,
    config: &'a ProbeConfig,
}

impl<'a> FileTreeProber<'a> {
    pub fn new(guard: &'a RateLimitGuard, config: &'a ProbeConfig) -> Self {
        Self { guard, config }
    }

    /// Probe `repo` with `predicate`.
    ///
    /// Lists the root once and every root directory once. Deeper directories
    /// are never listed. A failing listing, including a missing root, fails
    /// the probe.
    pub async fn probe(&self, repo: &RepoId, predicate: &MarkerPredicate) -> Result<ProbeResult> {
        self.probe_with_root(repo, predicate)
            .await
            .map(|(result, _)| result)
    }

    /// Like [`probe`](Self::probe), also handing back the root listing so
    /// callers can look at root files without listing again.
    pub async fn probe_with_root(
        &self,
        repo: &RepoId,
        predicate: &MarkerPredicate,
    ) -> Result<(ProbeResult, Vec<ContentEntry>)> {
        let mut result = ProbeResult::default();

        let root = self.list(repo, "").await?;
        self.scan(&root, predicate, &mut result.root_matches);
        result.well_known_root = self.well_known(&root).map(|e| e.name.clone()).collect();

        for dir in root.iter().filter(|e| e.is_dir()) {
            let children = self.list(repo, &dir.path).await?;
            self.scan(&children, predicate, &mut result.nested_matches);
            result
                .well_known_nested
                .extend(self.well_known(&children).map(|e| e.path.clone()));
        }

        if !self.config.content_markers.is_empty() && result.any_match() {
            self.check_contents(repo, &mut result).await?;
        }

        tracing::debug!(
            repo = %repo,
            root_matches = result.root_matches.len(),
            nested_matches = result.nested_matches.len(),
            "Probed file tree"
        );
        Ok((result, root))
    }

    async fn list(&self, repo: &RepoId, path: &str) -> Result<Vec<ContentEntry>> {
        self.guard
            .invoke(BudgetCategory::Core, |api| api.list_dir(repo, path))
            .await
    }

    /// Record the first matching plain file of a listing.
    fn scan(&self, entries: &[ContentEntry], predicate: &MarkerPredicate, out: &mut Vec<String>) {
        if let Some(hit) = entries
            .iter()
            .find(|e| e.is_file() && predicate.matches(&e.name))
        {
            out.push(hit.path.clone());
        }
    }

    fn well_known<'e>(
        &'e self,
        entries: &'e [ContentEntry],
    ) -> impl Iterator<Item = &'e ContentEntry> + 'e {
        entries
            .iter()
            .filter(|e| e.is_file() && self.config.well_known.iter().any(|n| *n == e.name))
    }

    /// Download matched files and look for the configured substrings.
    ///
    /// Files that are not valid UTF-8 are reported and skipped.
    async fn check_contents(&self, repo: &RepoId, result: &mut ProbeResult) -> Result<()> {
        let paths: Vec<String> = result
            .root_matches
            .iter()
            .chain(result.nested_matches.iter())
            .cloned()
            .collect();

        for path in paths {
            let bytes = self
                .guard
                .invoke(BudgetCategory::Core, |api| api.get_file(repo, &path))
                .await?;

            let text = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(repo = %repo, path = %path, error = %e, "Could not decode file");
                    result.undecodable.push(path);
                    continue;
                }
            };

            for marker in &self.config.content_markers {
                if text.contains(marker.as_str()) && !result.content_markers.contains(marker) {
                    result.content_markers.push(marker.clone());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{FakePlatform, FakeRepo};

    fn prober_fixture(fake: &Arc<FakePlatform>) -> RateLimitGuard {
        RateLimitGuard::new(fake.clone())
    }

    #[tokio::test]
    async fn finds_first_root_match_only() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(
            FakeRepo::new("nf-core", "rnaseq")
                .file("README.md", b"# rnaseq")
                .file("main.nf", b"workflow {}")
                .file("other.nf", b"process x {}"),
        );
        let guard = prober_fixture(&fake);
        let config = ProbeConfig::default();
        let prober = FileTreeProber::new(&guard, &config);

        let result = prober
            .probe(&RepoId::new("nf-core", "rnaseq"), &config.marker)
            .await
            .unwrap();

        assert_eq!(result.root_matches, vec!["main.nf"]);
        assert!(result.nested_matches.is_empty());
        assert!(result.any_match());
        assert!(result.has_well_known_root("main.nf"));
    }

    #[tokio::test]
    async fn finds_first_match_per_subdirectory() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(
            FakeRepo::new("someone", "pipelines")
                .file("README.md", b"")
                .file("align/main.nf", b"")
                .file("align/extra.nf", b"")
                .file("call/variants.nf", b"")
                .file("call/nextflow.config", b"")
                .file("docs/index.md", b""),
        );
        let guard = prober_fixture(&fake);
        let config = ProbeConfig::default();
        let prober = FileTreeProber::new(&guard, &config);

        let result = prober
            .probe(&RepoId::new("someone", "pipelines"), &config.marker)
            .await
            .unwrap();

        assert!(result.root_matches.is_empty());
        assert_eq!(result.nested_matches, vec!["align/main.nf", "call/variants.nf"]);
        assert!(result.has_well_known_nested("main.nf"));
        assert!(result.has_well_known_nested("nextflow.config"));
        assert!(result.any_match());
    }

    #[tokio::test]
    async fn never_lists_deeper_than_one_level() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(
            FakeRepo::new("deep", "tree")
                .file("README.md", b"")
                .file("a/b/c/main.nf", b"")
                .file("a/b/other.nf", b""),
        );
        let guard = prober_fixture(&fake);
        let config = ProbeConfig::default();
        let prober = FileTreeProber::new(&guard, &config);

        let result = prober
            .probe(&RepoId::new("deep", "tree"), &config.marker)
            .await
            .unwrap();

        assert!(!result.any_match());
        let listed = fake.listed_paths(&RepoId::new("deep", "tree"));
        assert_eq!(listed, vec!["".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn missing_root_fails_the_probe() {
        let fake = Arc::new(FakePlatform::new());
        let guard = prober_fixture(&fake);
        let config = ProbeConfig::default();
        let prober = FileTreeProber::new(&guard, &config);

        let err = prober
            .probe(&RepoId::new("ghost", "repo"), &config.marker)
            .await
            .expect_err("root listing should fail");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn content_markers_are_checked_and_decode_failures_reported() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(
            FakeRepo::new("dsl", "two")
                .file("main.nf", b"nextflow.enable.dsl=2\nworkflow {}")
                .file("bin/broken.nf", &[0xff, 0xfe, 0x00]),
        );
        let guard = prober_fixture(&fake);
        let config = ProbeConfig {
            content_markers: vec!["nextflow.enable.dsl=2".to_string(), "DSL1".to_string()],
            ..ProbeConfig::default()
        };
        let prober = FileTreeProber::new(&guard, &config);

        let result = prober
            .probe(&RepoId::new("dsl", "two"), &config.marker)
            .await
            .unwrap();

        assert_eq!(result.content_markers, vec!["nextflow.enable.dsl=2"]);
        assert_eq!(result.undecodable, vec!["bin/broken.nf"]);
    }

    #[tokio::test]
    async fn no_file_downloads_without_content_markers() {
        let fake = Arc::new(FakePlatform::new());
        fake.add_repo(FakeRepo::new("plain", "repo").file("main.nf", b"workflow {}"));
        let guard = prober_fixture(&fake);
        let config = ProbeConfig::default();
        let prober = FileTreeProber::new(&guard, &config);

        prober
            .probe(&RepoId::new("plain", "repo"), &config.marker)
            .await
            .unwrap();

        assert_eq!(fake.call_count("get_file"), 0);
    }
}
