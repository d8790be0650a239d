mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Repository operations
    fn create_repository(&self, repo: &Repository) -> Result<()>;
    fn get_repository(&self, id: &str) -> Result<Option<Repository>>;
    fn get_repository_by_external_id(&self, external_id: &str) -> Result<Option<Repository>>;
    fn get_repository_by_source(&self, owner: &str, repo: &str) -> Result<Option<Repository>>;
    fn list_repositories(&self) -> Result<Vec<Repository>>;
    fn delete_repository(&self, id: &str) -> Result<bool>;
    fn update_sync_status(&self, id: &str, status: SyncStatus, error: Option<&str>) -> Result<()>;
    /// Atomically claim a repository for syncing. Returns false when another
    /// run already holds the `syncing` status.
    fn try_begin_sync(&self, id: &str) -> Result<bool>;
    fn finish_sync(
        &self,
        id: &str,
        stats: &SyncStats,
        commit_sha: &str,
        commit_at: &DateTime<Utc>,
    ) -> Result<()>;
    fn set_ignore_patterns(&self, id: &str, patterns: Option<&[String]>) -> Result<()>;
    fn refresh_cards_count(&self, id: &str) -> Result<i64>;

    // Card operations
    fn upsert_card(&self, card: &Card) -> Result<()>;
    fn get_card(&self, id: &str) -> Result<Option<Card>>;
    fn get_card_by_path(&self, repository_id: &str, file_path: &str) -> Result<Option<Card>>;
    fn list_cards(&self, repository_id: &str, include_removed: bool) -> Result<Vec<Card>>;
    fn mark_card_unavailable(&self, repository_id: &str, file_path: &str) -> Result<bool>;
    fn update_card_content(&self, card_id: &str, content: &str) -> Result<()>;

    // Card image operations
    fn upsert_card_image(&self, image: &CardImage) -> Result<()>;
    fn get_card_image(&self, card_id: &str, original_path: &str) -> Result<Option<CardImage>>;
    fn list_card_images(&self, card_id: &str) -> Result<Vec<CardImage>>;
    fn delete_card_image(&self, card_id: &str, original_path: &str) -> Result<bool>;

    // Chunk buffer operations
    fn insert_chunk(&self, entry: &ChunkBufferEntry) -> Result<()>;
    fn list_chunks(&self, chunk_id: &str) -> Result<Vec<ChunkBufferEntry>>;
    fn delete_chunks(&self, chunk_id: &str) -> Result<usize>;
}
