//! The card reconciliation core.
//!
//! Given one (repository, file path, content) snapshot, decides
//! add/update/skip/soft-delete and writes the result, keeping rendered image
//! references pointed at stable storage URLs. Reconciliations are idempotent
//! and hash-gated, so pull sync and webhook push can interleave in any order
//! and still converge on the same state for each path.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use uuid::Uuid;

use super::{frontmatter, hash, images};
use crate::error::Result;
use crate::storage::ObjectStore;
use crate::store::Store;
use crate::types::{Card, CardImage, Repository};

pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp"];

/// How a markdown reconciliation classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Added,
    Updated,
    Unchanged,
}

fn extension(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

#[must_use]
pub fn is_markdown_path(path: &str) -> bool {
    extension(path).is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext.as_str()))
}

#[must_use]
pub fn is_image_path(path: &str) -> bool {
    extension(path).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

pub struct Reconciler<'a> {
    store: &'a dyn Store,
    objects: &'a dyn ObjectStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn Store, objects: &'a dyn ObjectStore) -> Self {
        Self { store, objects }
    }

    /// Soft-delete the card at `path`. Missing cards are a no-op, not an
    /// error; content and hash are untouched either way.
    pub fn delete_card(&self, repo: &Repository, path: &str) -> Result<bool> {
        let removed = self.store.mark_card_unavailable(&repo.id, path)?;
        if removed {
            tracing::info!("card {}:{} marked source-unavailable", repo.id, path);
        }
        Ok(removed)
    }

    /// Reconcile one markdown snapshot.
    pub async fn upsert_markdown(
        &self,
        repo: &Repository,
        path: &str,
        text: &str,
    ) -> Result<Outcome> {
        let content_hash = hash::hash_text(text);
        let existing = self.store.get_card_by_path(&repo.id, path)?;

        if let Some(card) = &existing {
            if card.source_available && card.content_hash == content_hash {
                return Ok(Outcome::Unchanged);
            }
        }

        let parsed = frontmatter::parse(text);
        let title = frontmatter::title_for(&parsed.metadata, path);

        // Rewrite references whose storage location is already known
        let mut replacements = HashMap::new();
        if let Some(card) = &existing {
            for image in self.store.list_card_images(&card.id)? {
                replacements.insert(
                    image.original_path,
                    self.objects.public_url(&image.storage_path),
                );
            }
        }
        let content = images::rewrite(&parsed.body, &replacements);

        let now = Utc::now();
        let card = Card {
            id: existing
                .as_ref()
                .map_or_else(|| Uuid::new_v4().to_string(), |card| card.id.clone()),
            repository_id: repo.id.clone(),
            file_path: path.to_string(),
            title,
            content,
            raw_content: text.to_string(),
            content_hash,
            frontmatter: parsed.metadata,
            source_available: true,
            created_at: existing.as_ref().map_or(now, |card| card.created_at),
            updated_at: now,
        };
        self.store.upsert_card(&card)?;

        Ok(if existing.is_some() {
            Outcome::Updated
        } else {
            Outcome::Added
        })
    }

    /// Reconcile one image snapshot: upload idempotently, then point every
    /// card referencing the path at the new storage URL. Returns the storage
    /// key.
    pub async fn upsert_image(
        &self,
        repo: &Repository,
        path: &str,
        data: &[u8],
    ) -> Result<String> {
        let ext = extension(path).unwrap_or_else(|| "bin".to_string());
        let key = format!(
            "{}/{}/{}.{ext}",
            repo.owner,
            repo.repo,
            hash::short_hash(data)
        );
        self.objects.put(&key, data).await?;
        tracing::debug!("stored image {path} as {key}");

        for card in self.store.list_cards(&repo.id, false)? {
            let matching: Vec<String> = images::extract_refs(&card.raw_content)
                .into_iter()
                .map(|reference| reference.target)
                .filter(|target| images::matches_incoming(target, path))
                .collect();
            if matching.is_empty() {
                continue;
            }

            let now = Utc::now();
            for original_path in &matching {
                self.store.upsert_card_image(&CardImage {
                    card_id: card.id.clone(),
                    original_path: original_path.clone(),
                    storage_path: key.clone(),
                    created_at: now,
                })?;
            }

            self.rerender_card(&card)?;
        }

        Ok(key)
    }

    /// Remove an image from the mirror: delete the stored objects and the
    /// mapping rows. Cards keep their last-rewritten URLs.
    pub async fn delete_image(&self, repo: &Repository, path: &str) -> Result<usize> {
        let mut storage_keys = HashSet::new();
        let mut removed = 0;

        for card in self.store.list_cards(&repo.id, true)? {
            for image in self.store.list_card_images(&card.id)? {
                if images::matches_incoming(&image.original_path, path)
                    && self
                        .store
                        .delete_card_image(&card.id, &image.original_path)?
                {
                    storage_keys.insert(image.storage_path);
                    removed += 1;
                }
            }
        }

        for key in storage_keys {
            self.objects.delete(&key).await?;
        }

        Ok(removed)
    }

    /// Rebuild a card's rendered content from its raw body and the full set
    /// of known image mappings, persisting only on an actual change.
    fn rerender_card(&self, card: &Card) -> Result<()> {
        let mut replacements = HashMap::new();
        for image in self.store.list_card_images(&card.id)? {
            replacements.insert(
                image.original_path,
                self.objects.public_url(&image.storage_path),
            );
        }

        let body = frontmatter::parse(&card.raw_content).body;
        let rendered = images::rewrite(&body, &replacements);
        if rendered != card.content {
            self.store.update_card_content(&card.id, &rendered)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsObjectStorage;
    use crate::store::SqliteStore;
    use crate::types::{SyncStats, SyncStatus};
    use tempfile::TempDir;

    fn setup() -> (TempDir, SqliteStore, FsObjectStorage, Repository) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let objects = FsObjectStorage::new(temp.path(), "http://localhost:8080");

        let repo = Repository {
            id: "repo-1".to_string(),
            owner: "acme".to_string(),
            repo: "cards".to_string(),
            branch: "main".to_string(),
            access_token: None,
            external_id: None,
            ignore_patterns: None,
            sync_status: SyncStatus::Pending,
            sync_error: None,
            last_commit_sha: None,
            last_commit_at: None,
            last_stats: SyncStats::default(),
            cards_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.create_repository(&repo).unwrap();

        (temp, store, objects, repo)
    }

    #[test]
    fn test_extension_allow_lists() {
        assert!(is_markdown_path("legs/squat.md"));
        assert!(is_markdown_path("a/b.MARKDOWN"));
        assert!(!is_markdown_path("legs/squat.md.bak"));
        assert!(is_image_path("img/a.PNG"));
        assert!(is_image_path("img/a.webp"));
        assert!(!is_image_path("img/a.pdf"));
        assert!(!is_image_path("Makefile"));
    }

    #[tokio::test]
    async fn test_markdown_idempotence() {
        let (_temp, store, objects, repo) = setup();
        let rec = Reconciler::new(&store, &objects);

        let text = "---\ntitle: Squat\n---\nBody\n";
        assert_eq!(
            rec.upsert_markdown(&repo, "squat.md", text).await.unwrap(),
            Outcome::Added
        );
        assert_eq!(
            rec.upsert_markdown(&repo, "squat.md", text).await.unwrap(),
            Outcome::Unchanged
        );
        assert_eq!(
            rec.upsert_markdown(&repo, "squat.md", "changed").await.unwrap(),
            Outcome::Updated
        );

        let card = store.get_card_by_path("repo-1", "squat.md").unwrap().unwrap();
        assert_eq!(card.content_hash, hash::hash_text("changed"));
    }

    #[tokio::test]
    async fn test_markdown_parses_frontmatter() {
        let (_temp, store, objects, repo) = setup();
        let rec = Reconciler::new(&store, &objects);

        rec.upsert_markdown(&repo, "legs/squat.md", "---\ntitle: Goblet Squat\n---\n# Setup\n")
            .await
            .unwrap();

        let card = store
            .get_card_by_path("repo-1", "legs/squat.md")
            .unwrap()
            .unwrap();
        assert_eq!(card.title, "Goblet Squat");
        assert_eq!(card.content, "# Setup\n");
        assert!(card.raw_content.starts_with("---"));

        rec.upsert_markdown(&repo, "legs/lunge.md", "no frontmatter")
            .await
            .unwrap();
        let card = store
            .get_card_by_path("repo-1", "legs/lunge.md")
            .unwrap()
            .unwrap();
        assert_eq!(card.title, "lunge");
    }

    #[tokio::test]
    async fn test_soft_delete_is_non_destructive() {
        let (_temp, store, objects, repo) = setup();
        let rec = Reconciler::new(&store, &objects);

        rec.upsert_markdown(&repo, "a.md", "content").await.unwrap();
        assert!(rec.delete_card(&repo, "a.md").unwrap());
        assert!(!rec.delete_card(&repo, "missing.md").unwrap());

        let card = store.get_card_by_path("repo-1", "a.md").unwrap().unwrap();
        assert!(!card.source_available);
        assert_eq!(card.raw_content, "content");
        assert_eq!(card.content_hash, hash::hash_text("content"));
    }

    #[tokio::test]
    async fn test_deleted_card_resurrects_as_updated() {
        let (_temp, store, objects, repo) = setup();
        let rec = Reconciler::new(&store, &objects);

        rec.upsert_markdown(&repo, "a.md", "content").await.unwrap();
        rec.delete_card(&repo, "a.md").unwrap();

        // Same hash, but unavailable: must re-upsert, not skip
        assert_eq!(
            rec.upsert_markdown(&repo, "a.md", "content").await.unwrap(),
            Outcome::Updated
        );
        let card = store.get_card_by_path("repo-1", "a.md").unwrap().unwrap();
        assert!(card.source_available);
    }

    #[tokio::test]
    async fn test_image_upload_and_rewrite() {
        let (_temp, store, objects, repo) = setup();
        let rec = Reconciler::new(&store, &objects);

        rec.upsert_markdown(&repo, "legs/squat.md", "Setup ![side](./diagrams/a.png)\n")
            .await
            .unwrap();

        let key = rec
            .upsert_image(&repo, "legs/diagrams/a.png", b"png-bytes")
            .await
            .unwrap();
        assert_eq!(
            key,
            format!("acme/cards/{}.png", hash::short_hash(b"png-bytes"))
        );
        assert!(objects.exists(&key).await.unwrap());

        let card = store
            .get_card_by_path("repo-1", "legs/squat.md")
            .unwrap()
            .unwrap();
        let url = objects.public_url(&key);
        assert_eq!(card.content, format!("Setup ![side]({url})\n"));
        // Raw content is never rewritten
        assert!(card.raw_content.contains("./diagrams/a.png"));

        let mapping = store
            .get_card_image(&card.id, "./diagrams/a.png")
            .unwrap()
            .unwrap();
        assert_eq!(mapping.storage_path, key);
    }

    #[tokio::test]
    async fn test_image_resync_reuses_storage_path() {
        let (_temp, store, objects, repo) = setup();
        let rec = Reconciler::new(&store, &objects);

        rec.upsert_markdown(&repo, "a.md", "![x](./img/a.png)").await.unwrap();

        let first = rec.upsert_image(&repo, "img/a.png", b"same-bytes").await.unwrap();
        let second = rec.upsert_image(&repo, "img/a.png", b"same-bytes").await.unwrap();
        assert_eq!(first, second);

        // Changed bytes land at a new key and the card follows
        let third = rec.upsert_image(&repo, "img/a.png", b"new-bytes").await.unwrap();
        assert_ne!(first, third);
        let card = store.get_card_by_path("repo-1", "a.md").unwrap().unwrap();
        assert!(card.content.contains(&objects.public_url(&third)));
    }

    #[tokio::test]
    async fn test_markdown_rewrite_from_known_mappings() {
        let (_temp, store, objects, repo) = setup();
        let rec = Reconciler::new(&store, &objects);

        rec.upsert_markdown(&repo, "a.md", "v1 ![x](./img/a.png)").await.unwrap();
        let key = rec.upsert_image(&repo, "img/a.png", b"bytes").await.unwrap();

        // A later text edit keeps the rewritten URL without refetching
        rec.upsert_markdown(&repo, "a.md", "v2 ![x](./img/a.png)").await.unwrap();
        let card = store.get_card_by_path("repo-1", "a.md").unwrap().unwrap();
        assert_eq!(card.content, format!("v2 ![x]({})", objects.public_url(&key)));
    }

    #[tokio::test]
    async fn test_delete_image_keeps_card_urls() {
        let (_temp, store, objects, repo) = setup();
        let rec = Reconciler::new(&store, &objects);

        rec.upsert_markdown(&repo, "a.md", "![x](./img/a.png)").await.unwrap();
        let key = rec.upsert_image(&repo, "img/a.png", b"bytes").await.unwrap();
        let url = objects.public_url(&key);

        let removed = rec.delete_image(&repo, "img/a.png").await.unwrap();
        assert_eq!(removed, 1);
        assert!(!objects.exists(&key).await.unwrap());

        // The card keeps its last-rewritten URL (broken-link risk accepted)
        let card = store.get_card_by_path("repo-1", "a.md").unwrap().unwrap();
        assert!(card.content.contains(&url));
        assert!(store.list_card_images(&card.id).unwrap().is_empty());
    }
}
