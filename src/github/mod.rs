//! The GitHub-shaped source host collaborator.
//!
//! Pull sync needs four operations against the source: latest commit for the
//! designated branch, a full recursive tree listing, raw text fetch, and raw
//! binary fetch. Each may be authenticated with a per-repository credential
//! for private sources. Fetch failures are not retried here; a failed pull
//! run surfaces `error` status and is safe to re-invoke.

mod client;

pub use client::GithubClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::Repository;

#[derive(Debug, Clone)]
pub struct CommitRef {
    pub sha: String,
    pub committed_at: DateTime<Utc>,
}

/// One blob in the repository tree.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub path: String,
    pub sha: String,
}

#[async_trait]
pub trait SourceHost: Send + Sync {
    async fn latest_commit(&self, repo: &Repository) -> Result<CommitRef>;
    async fn tree(&self, repo: &Repository, commit_sha: &str) -> Result<Vec<TreeEntry>>;
    async fn fetch_text(&self, repo: &Repository, path: &str) -> Result<String>;
    async fn fetch_bytes(&self, repo: &Repository, path: &str) -> Result<Vec<u8>>;
}
