//! Full-tree pull synchronization.
//!
//! Walks the remote tree, drives the reconciler across every allow-listed
//! file, and sweeps cards whose backing files disappeared. The `syncing`
//! status is the serialization guard: one run per repository at a time.
//! Failures abort the run and persist `error` status without rolling back
//! already-committed writes; re-running is idempotent and reconciles to the
//! correct end state.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::reconcile::{Reconciler, is_image_path, is_markdown_path};
use super::{IGNORE_FILE, ignore};
use crate::error::{Error, Result};
use crate::github::SourceHost;
use crate::storage::ObjectStore;
use crate::store::Store;
use crate::sync::images;
use crate::types::{Repository, SyncStats, SyncStatus};

#[derive(Debug, Clone)]
pub struct PullSyncReport {
    pub stats: SyncStats,
    pub cards_count: i64,
    pub commit_sha: String,
    pub commit_at: DateTime<Utc>,
}

pub struct PullSync<'a> {
    store: &'a dyn Store,
    source: &'a dyn SourceHost,
    objects: &'a dyn ObjectStore,
}

impl<'a> PullSync<'a> {
    pub fn new(
        store: &'a dyn Store,
        source: &'a dyn SourceHost,
        objects: &'a dyn ObjectStore,
    ) -> Self {
        Self {
            store,
            source,
            objects,
        }
    }

    pub async fn run(&self, repository_id: &str, force: bool) -> Result<PullSyncReport> {
        let repo = self
            .store
            .get_repository(repository_id)?
            .ok_or(Error::NotFound)?;

        if !self.store.try_begin_sync(&repo.id)? {
            return Err(Error::SyncInProgress);
        }

        match self.run_inner(&repo, force).await {
            Ok(report) => {
                tracing::info!(
                    "pull sync of {}/{} finished: +{} ~{} -{} ={}",
                    repo.owner,
                    repo.repo,
                    report.stats.added,
                    report.stats.updated,
                    report.stats.removed,
                    report.stats.unchanged
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!("pull sync of {}/{} failed: {e}", repo.owner, repo.repo);
                self.store
                    .update_sync_status(&repo.id, SyncStatus::Error, Some(&e.to_string()))?;
                Err(e)
            }
        }
    }

    async fn run_inner(&self, repo: &Repository, force: bool) -> Result<PullSyncReport> {
        let head = self.source.latest_commit(repo).await?;

        // Common case: nothing moved since the last synced commit
        if !force && repo.last_commit_sha.as_deref() == Some(head.sha.as_str()) {
            let stats = SyncStats {
                unchanged: self.store.list_cards(&repo.id, false)?.len() as i64,
                ..SyncStats::default()
            };
            self.store
                .finish_sync(&repo.id, &stats, &head.sha, &head.committed_at)?;
            let cards_count = self.store.refresh_cards_count(&repo.id)?;
            return Ok(PullSyncReport {
                stats,
                cards_count,
                commit_sha: head.sha,
                commit_at: head.committed_at,
            });
        }

        let tree = self.source.tree(repo, &head.sha).await?;
        let patterns = self.refresh_ignore_patterns(repo, &tree).await?;

        let reconciler = Reconciler::new(self.store, self.objects);
        let mut stats = SyncStats::default();
        let mut processed: HashSet<String> = HashSet::new();
        let mut image_paths: Vec<String> = Vec::new();

        for entry in &tree {
            if ignore::is_ignored(&entry.path, &patterns) {
                continue;
            }
            if is_markdown_path(&entry.path) {
                let text = self.source.fetch_text(repo, &entry.path).await?;
                match reconciler.upsert_markdown(repo, &entry.path, &text).await? {
                    super::Outcome::Added => stats.added += 1,
                    super::Outcome::Updated => stats.updated += 1,
                    super::Outcome::Unchanged => stats.unchanged += 1,
                }
                processed.insert(entry.path.clone());
            } else if is_image_path(&entry.path) {
                image_paths.push(entry.path.clone());
            }
        }

        // Mirror binaries the cards actually reference; skip those whose
        // references are all mapped already unless forced
        let demand = self.image_demand(repo)?;
        for path in &image_paths {
            let Some(fully_mapped) = demand.get(path) else {
                continue;
            };
            if *fully_mapped && !force {
                continue;
            }
            let data = self.source.fetch_bytes(repo, path).await?;
            reconciler.upsert_image(repo, path, &data).await?;
        }

        // Removal sweep: every available card whose path the walk did not
        // touch has disappeared from the source
        for card in self.store.list_cards(&repo.id, false)? {
            if !processed.contains(&card.file_path)
                && reconciler.delete_card(repo, &card.file_path)?
            {
                stats.removed += 1;
            }
        }

        self.store
            .finish_sync(&repo.id, &stats, &head.sha, &head.committed_at)?;
        let cards_count = self.store.refresh_cards_count(&repo.id)?;

        Ok(PullSyncReport {
            stats,
            cards_count,
            commit_sha: head.sha,
            commit_at: head.committed_at,
        })
    }

    /// Read-through refresh of the cached `.lumioignore` patterns: prefer
    /// the file in the tree, fall back to the previously cached patterns.
    async fn refresh_ignore_patterns(
        &self,
        repo: &Repository,
        tree: &[crate::github::TreeEntry],
    ) -> Result<Vec<String>> {
        if let Some(entry) = tree.iter().find(|entry| entry.path == IGNORE_FILE) {
            let text = self.source.fetch_text(repo, &entry.path).await?;
            let patterns = ignore::parse_patterns(&text);
            self.store.set_ignore_patterns(&repo.id, Some(&patterns))?;
            return Ok(patterns);
        }
        Ok(repo.ignore_patterns.clone().unwrap_or_default())
    }

    /// Repository-relative image paths referenced by available cards, and
    /// whether every reference to each already has a storage mapping.
    fn image_demand(&self, repo: &Repository) -> Result<HashMap<String, bool>> {
        let mut demand: HashMap<String, bool> = HashMap::new();

        for card in self.store.list_cards(&repo.id, false)? {
            for reference in images::extract_refs(&card.raw_content) {
                let resolved = images::resolve(&card.file_path, &reference.target);
                if resolved.is_empty() {
                    continue;
                }
                let mapped = self
                    .store
                    .get_card_image(&card.id, &reference.target)?
                    .is_some();
                demand
                    .entry(resolved)
                    .and_modify(|all| *all = *all && mapped)
                    .or_insert(mapped);
            }
        }

        Ok(demand)
    }
}
