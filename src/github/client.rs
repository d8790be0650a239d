use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{CommitRef, SourceHost, TreeEntry};
use crate::error::{Error, Result};
use crate::types::Repository;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("lumio/", env!("CARGO_PKG_VERSION"));

/// GitHub REST v3 client.
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    committer: Option<CommitSignature>,
    author: Option<CommitSignature>,
}

#[derive(Deserialize)]
struct CommitSignature {
    date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GithubClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    /// Point the client at a different API host (GitHub Enterprise, tests).
    #[must_use]
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, repo: &Repository, url: String, accept: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, accept);
        if let Some(token) = &repo.access_token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::SourceHost(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::SourceHost(format!(
                "github responded {status} for {}",
                response.url()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl SourceHost for GithubClient {
    async fn latest_commit(&self, repo: &Repository) -> Result<CommitRef> {
        let url = format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_base, repo.owner, repo.repo, repo.branch
        );
        let response = self
            .send(self.request(repo, url, "application/vnd.github+json"))
            .await?;

        let commit: CommitResponse = response
            .json()
            .await
            .map_err(|e| Error::SourceHost(format!("invalid commit response: {e}")))?;

        let committed_at = commit
            .commit
            .committer
            .or(commit.commit.author)
            .map(|signature| signature.date)
            .unwrap_or_else(Utc::now);

        Ok(CommitRef {
            sha: commit.sha,
            committed_at,
        })
    }

    async fn tree(&self, repo: &Repository, commit_sha: &str) -> Result<Vec<TreeEntry>> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base, repo.owner, repo.repo, commit_sha
        );
        let response = self
            .send(self.request(repo, url, "application/vnd.github+json"))
            .await?;

        let tree: TreeResponse = response
            .json()
            .await
            .map_err(|e| Error::SourceHost(format!("invalid tree response: {e}")))?;

        if tree.truncated {
            tracing::warn!(
                "tree listing for {}/{} at {} was truncated by github",
                repo.owner,
                repo.repo,
                commit_sha
            );
        }

        Ok(tree
            .tree
            .into_iter()
            .filter(|item| item.kind == "blob")
            .map(|item| TreeEntry {
                path: item.path,
                sha: item.sha,
            })
            .collect())
    }

    async fn fetch_text(&self, repo: &Repository, path: &str) -> Result<String> {
        let response = self
            .send(self.request(repo, self.contents_url(repo, path), "application/vnd.github.raw+json"))
            .await?;
        response
            .text()
            .await
            .map_err(|e| Error::SourceHost(format!("failed reading {path}: {e}")))
    }

    async fn fetch_bytes(&self, repo: &Repository, path: &str) -> Result<Vec<u8>> {
        let response = self
            .send(self.request(repo, self.contents_url(repo, path), "application/vnd.github.raw+json"))
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::SourceHost(format!("failed reading {path}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

impl GithubClient {
    fn contents_url(&self, repo: &Repository, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_base,
            repo.owner,
            repo.repo,
            path.trim_start_matches('/'),
            repo.branch
        )
    }
}
