//! REST client for the GitHub API.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use url::Url;

use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpHeaders, HttpRequest, HttpResponse, HttpTransport};
use crate::platform::{
    self, ContentEntry, IssueState, PlatformClient, RateLimits, ReleaseInfo, RepoDetails, RepoId,
    SearchPage,
};

use super::error::{GitHubError, classify_response};
use super::pagination::parse_link_header;
use super::types::{
    GitHubCommit, GitHubContentItem, GitHubFileContent, GitHubRateLimitResponse, GitHubRelease,
    GitHubRepo, GitHubSearchResponse, GitHubTopics, sort_languages,
};

/// Public API root.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// GitHub client implementing [`PlatformClient`].
///
/// Every method issues exactly one request. Retrying after rate limits is the
/// caller's job (see [`crate::retry::RateLimitGuard`]).
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client for the public API. An empty or missing token makes
    /// anonymous requests.
    pub fn new(token: Option<&str>) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)?;
        Ok(Self::new_with_transport(
            DEFAULT_API_BASE,
            token,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        api_base: impl Into<String>,
        token: Option<&str>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn headers(&self) -> HttpHeaders {
        let mut headers = vec![
            (
                "Accept".to_string(),
                "application/vnd.github+json".to_string(),
            ),
            (
                "X-GitHub-Api-Version".to_string(),
                API_VERSION.to_string(),
            ),
        ];
        if let Some(token) = &self.token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }

    /// Build `{api_base}/{segments...}` with each segment percent-encoded.
    fn endpoint<'s>(
        &self,
        segments: impl IntoIterator<Item = &'s str>,
    ) -> Result<Url, GitHubError> {
        let mut url = Url::parse(&self.api_base)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn repo_endpoint(&self, repo: &RepoId, tail: &[&str]) -> Result<Url, GitHubError> {
        let head = ["repos", repo.owner.as_str(), repo.name.as_str()];
        self.endpoint(head.into_iter().chain(tail.iter().copied()))
    }

    fn contents_endpoint(&self, repo: &RepoId, path: &str) -> Result<Url, GitHubError> {
        let mut tail = vec!["contents"];
        tail.extend(path.split('/').filter(|s| !s.is_empty()));
        self.repo_endpoint(repo, &tail)
    }

    async fn send(&self, url: Url, resource: &str) -> Result<HttpResponse, GitHubError> {
        let request = HttpRequest::get(url.as_str(), self.headers());
        let response = self.transport.send(request).await?;

        if response.is_success() {
            Ok(response)
        } else {
            let err = classify_response(&response, resource);
            tracing::debug!(url = %url, status = response.status, error = %err, "GitHub request failed");
            Err(err)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, resource: &str) -> Result<T, GitHubError> {
        let response = self.send(url, resource).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Count the items of a list endpoint with a single `per_page=1` request.
    ///
    /// With one item per page the `rel="last"` page number is the item count.
    /// Without a Link header everything fit on one page.
    async fn count(&self, mut url: Url, resource: &str) -> Result<u64, GitHubError> {
        url.query_pairs_mut().append_pair("per_page", "1");
        let response = self.send(url, resource).await?;

        // Contributors of an empty repository come back as 204.
        if response.status == 204 || response.body.is_empty() {
            return Ok(0);
        }

        if let Some(last) = response
            .header("link")
            .map(parse_link_header)
            .and_then(|links| links.total_pages())
        {
            return Ok(u64::from(last));
        }

        let items: Vec<serde_json::Value> = serde_json::from_slice(&response.body)?;
        Ok(items.len() as u64)
    }

    /// First element of a list endpoint, if any.
    async fn first<T: DeserializeOwned>(
        &self,
        mut url: Url,
        resource: &str,
    ) -> Result<Option<T>, GitHubError> {
        url.query_pairs_mut().append_pair("per_page", "1");
        let items: Vec<T> = self.get_json(url, resource).await?;
        Ok(items.into_iter().next())
    }

    async fn fetch_file(&self, repo: &RepoId, path: &str) -> Result<Vec<u8>, GitHubError> {
        let resource = format!("{}/{}", repo.full_name(), path);
        let url = self.contents_endpoint(repo, path)?;
        let file: GitHubFileContent = self.get_json(url, &resource).await?;
        decode_content(&file).map_err(|message| GitHubError::Content(format!("{resource}: {message}")))
    }

    async fn commit_date(&self, repo: &RepoId) -> Result<Option<DateTime<Utc>>, GitHubError> {
        let url = self.repo_endpoint(repo, &["commits"])?;
        match self.first::<GitHubCommit>(url, &repo.full_name()).await {
            Ok(commit) => Ok(commit.and_then(|c| c.committed_at())),
            // "Git Repository is empty."
            Err(GitHubError::Api { status: 409, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn state_endpoint(
        &self,
        repo: &RepoId,
        kind: &str,
        state: IssueState,
    ) -> Result<Url, GitHubError> {
        let mut url = self.repo_endpoint(repo, &[kind])?;
        url.query_pairs_mut().append_pair("state", state.as_str());
        Ok(url)
    }
}

/// Decode the `content` field of a contents response.
fn decode_content(file: &GitHubFileContent) -> Result<Vec<u8>, String> {
    match (file.encoding.as_deref(), file.content.as_deref()) {
        (Some("base64"), Some(content)) => {
            // GitHub wraps the payload at 60 columns.
            let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            BASE64.decode(compact).map_err(|e| e.to_string())
        }
        (Some("none"), _) => Err("file too large for the contents API".to_string()),
        (encoding, _) => Err(format!(
            "unsupported encoding {}",
            encoding.unwrap_or("(missing)")
        )),
    }
}

#[async_trait]
impl PlatformClient for GitHubClient {
    async fn rate_limits(&self) -> platform::Result<RateLimits> {
        let url = self.endpoint(["rate_limit"])?;
        let response: GitHubRateLimitResponse = self.get_json(url, "rate_limit").await?;
        Ok(response.into())
    }

    async fn search_repositories(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> platform::Result<SearchPage> {
        let mut url = self.endpoint(["search", "repositories"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("sort", "updated")
            .append_pair("order", "desc")
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());

        let response: GitHubSearchResponse = self.get_json(url, "search/repositories").await?;
        Ok(response.into())
    }

    async fn get_repo(&self, repo: &RepoId) -> platform::Result<RepoDetails> {
        let url = self.repo_endpoint(repo, &[])?;
        let response: GitHubRepo = self.get_json(url, &repo.full_name()).await?;
        Ok(response.into())
    }

    async fn list_dir(&self, repo: &RepoId, path: &str) -> platform::Result<Vec<ContentEntry>> {
        let url = self.contents_endpoint(repo, path)?;
        let resource = format!("{}/{}", repo.full_name(), path);
        let items: Vec<GitHubContentItem> = self.get_json(url, &resource).await?;
        Ok(items.into_iter().map(ContentEntry::from).collect())
    }

    async fn get_file(&self, repo: &RepoId, path: &str) -> platform::Result<Vec<u8>> {
        Ok(self.fetch_file(repo, path).await?)
    }

    async fn list_topics(&self, repo: &RepoId) -> platform::Result<Vec<String>> {
        let url = self.repo_endpoint(repo, &["topics"])?;
        let topics: GitHubTopics = self.get_json(url, &repo.full_name()).await?;
        Ok(topics.names)
    }

    async fn list_languages(&self, repo: &RepoId) -> platform::Result<Vec<(String, u64)>> {
        let url = self.repo_endpoint(repo, &["languages"])?;
        let languages: HashMap<String, u64> = self.get_json(url, &repo.full_name()).await?;
        Ok(sort_languages(languages))
    }

    async fn latest_commit_date(&self, repo: &RepoId) -> platform::Result<Option<DateTime<Utc>>> {
        Ok(self.commit_date(repo).await?)
    }

    async fn count_releases(&self, repo: &RepoId) -> platform::Result<u64> {
        let url = self.repo_endpoint(repo, &["releases"])?;
        Ok(self.count(url, &repo.full_name()).await?)
    }

    async fn latest_release(&self, repo: &RepoId) -> platform::Result<Option<ReleaseInfo>> {
        let url = self.repo_endpoint(repo, &["releases"])?;
        let release: Option<GitHubRelease> = self.first(url, &repo.full_name()).await?;
        Ok(release.map(ReleaseInfo::from))
    }

    async fn count_issues(&self, repo: &RepoId, state: IssueState) -> platform::Result<u64> {
        // The issues endpoint also lists pull requests.
        let url = self.state_endpoint(repo, "issues", state)?;
        Ok(self.count(url, &repo.full_name()).await?)
    }

    async fn count_pulls(&self, repo: &RepoId, state: IssueState) -> platform::Result<u64> {
        let url = self.state_endpoint(repo, "pulls", state)?;
        Ok(self.count(url, &repo.full_name()).await?)
    }

    async fn count_contributors(&self, repo: &RepoId) -> platform::Result<u64> {
        let url = self.repo_endpoint(repo, &["contributors"])?;
        Ok(self.count(url, &repo.full_name()).await?)
    }
}
