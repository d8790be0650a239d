use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a repository's pull sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    Syncing,
    Synced,
    Error,
}

impl SyncStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "syncing" => SyncStatus::Syncing,
            "synced" => SyncStatus::Synced,
            "error" => SyncStatus::Error,
            _ => SyncStatus::Pending,
        }
    }
}

/// Aggregate counts from one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub added: i64,
    pub updated: i64,
    pub removed: i64,
    pub unchanged: i64,
}

/// One external GitHub source being mirrored.
///
/// Created when a coach registers a source; mutated exclusively by the sync
/// orchestrators afterwards. Never deleted automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    #[serde(skip)]
    pub access_token: Option<String>,
    /// Correlation id used by the Docora change-notification service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Cached `.lumioignore` patterns, refreshed whenever that file syncs.
    #[serde(skip)]
    pub ignore_patterns: Option<Vec<String>>,
    pub sync_status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit_sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit_at: Option<DateTime<Utc>>,
    pub last_stats: SyncStats,
    pub cards_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The mirrored record of one source markdown file.
///
/// `(repository_id, file_path)` is unique and stable. `content` carries the
/// rendered body with image references rewritten to storage URLs;
/// `raw_content` is the verbatim source. A card whose backing file disappears
/// keeps its last content with `source_available = false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub repository_id: String,
    pub file_path: String,
    pub title: String,
    pub content: String,
    pub raw_content: String,
    pub content_hash: String,
    pub frontmatter: serde_json::Map<String, serde_json::Value>,
    pub source_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Maps an image reference as written in a card's markdown to its
/// content-addressed storage location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardImage {
    pub card_id: String,
    pub original_path: String,
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
}

/// One buffered non-final fragment of a chunked webhook payload.
///
/// Rows for a chunk id are deleted together once the final fragment triggers
/// reassembly; persisting them lets a restarted server resume mid-transfer.
#[derive(Debug, Clone)]
pub struct ChunkBufferEntry {
    pub chunk_id: String,
    pub chunk_index: i64,
    pub chunk_total: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
