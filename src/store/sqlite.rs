use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

const REPOSITORY_COLUMNS: &str = "id, owner, repo, branch, access_token, external_id, \
     ignore_patterns, sync_status, sync_error, last_commit_sha, last_commit_at, \
     last_added, last_updated, last_removed, last_unchanged, cards_count, \
     created_at, updated_at";

fn repository_from_row(row: &Row) -> rusqlite::Result<Repository> {
    let ignore_patterns: Option<String> = row.get(6)?;
    let sync_status: String = row.get(7)?;
    let last_commit_at: Option<String> = row.get(10)?;
    Ok(Repository {
        id: row.get(0)?,
        owner: row.get(1)?,
        repo: row.get(2)?,
        branch: row.get(3)?,
        access_token: row.get(4)?,
        external_id: row.get(5)?,
        ignore_patterns: ignore_patterns.and_then(|s| serde_json::from_str(&s).ok()),
        sync_status: SyncStatus::parse(&sync_status),
        sync_error: row.get(8)?,
        last_commit_sha: row.get(9)?,
        last_commit_at: last_commit_at.map(|s| parse_datetime(&s)),
        last_stats: SyncStats {
            added: row.get(11)?,
            updated: row.get(12)?,
            removed: row.get(13)?,
            unchanged: row.get(14)?,
        },
        cards_count: row.get(15)?,
        created_at: parse_datetime(&row.get::<_, String>(16)?),
        updated_at: parse_datetime(&row.get::<_, String>(17)?),
    })
}

const CARD_COLUMNS: &str = "id, repository_id, file_path, title, content, raw_content, \
     content_hash, frontmatter, source_available, created_at, updated_at";

fn card_from_row(row: &Row) -> rusqlite::Result<Card> {
    let frontmatter: String = row.get(7)?;
    Ok(Card {
        id: row.get(0)?,
        repository_id: row.get(1)?,
        file_path: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        raw_content: row.get(5)?,
        content_hash: row.get(6)?,
        frontmatter: serde_json::from_str(&frontmatter).unwrap_or_default(),
        source_available: row.get(8)?,
        created_at: parse_datetime(&row.get::<_, String>(9)?),
        updated_at: parse_datetime(&row.get::<_, String>(10)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Repository operations

    fn create_repository(&self, repo: &Repository) -> Result<()> {
        let patterns = repo
            .ignore_patterns
            .as_ref()
            .map(|p| serde_json::to_string(p).unwrap_or_default());
        let result = self.conn().execute(
            "INSERT INTO repositories (id, owner, repo, branch, access_token, external_id,
                 ignore_patterns, sync_status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                repo.id,
                repo.owner,
                repo.repo,
                repo.branch,
                repo.access_token,
                repo.external_id,
                patterns,
                repo.sync_status.as_str(),
                format_datetime(&repo.created_at),
                format_datetime(&repo.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_repository(&self, id: &str) -> Result<Option<Repository>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE id = ?1"),
            params![id],
            repository_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_repository_by_external_id(&self, external_id: &str) -> Result<Option<Repository>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE external_id = ?1"),
            params![external_id],
            repository_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_repository_by_source(&self, owner: &str, repo: &str) -> Result<Option<Repository>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE owner = ?1 AND repo = ?2"),
            params![owner, repo],
            repository_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_repositories(&self) -> Result<Vec<Repository>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories ORDER BY owner, repo"
        ))?;

        let rows = stmt.query_map([], repository_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_repository(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM repositories WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_sync_status(&self, id: &str, status: SyncStatus, error: Option<&str>) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE repositories SET sync_status = ?1, sync_error = ?2, updated_at = ?3
             WHERE id = ?4",
            params![
                status.as_str(),
                error,
                format_datetime(&Utc::now()),
                id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn try_begin_sync(&self, id: &str) -> Result<bool> {
        // The status check and the claim are one statement, so concurrent
        // claims serialize on the connection and at most one sees a row
        let rows = self.conn().execute(
            "UPDATE repositories SET sync_status = 'syncing', sync_error = NULL, updated_at = ?1
             WHERE id = ?2 AND sync_status != 'syncing'",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(rows > 0)
    }

    fn finish_sync(
        &self,
        id: &str,
        stats: &SyncStats,
        commit_sha: &str,
        commit_at: &DateTime<Utc>,
    ) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE repositories SET
                 sync_status = 'synced', sync_error = NULL,
                 last_commit_sha = ?1, last_commit_at = ?2,
                 last_added = ?3, last_updated = ?4, last_removed = ?5, last_unchanged = ?6,
                 cards_count = (SELECT COUNT(*) FROM cards
                                WHERE repository_id = ?7 AND source_available = 1),
                 updated_at = ?8
             WHERE id = ?7",
            params![
                commit_sha,
                format_datetime(commit_at),
                stats.added,
                stats.updated,
                stats.removed,
                stats.unchanged,
                id,
                format_datetime(&Utc::now()),
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn set_ignore_patterns(&self, id: &str, patterns: Option<&[String]>) -> Result<()> {
        let serialized = patterns.map(|p| serde_json::to_string(p).unwrap_or_default());
        let rows = self.conn().execute(
            "UPDATE repositories SET ignore_patterns = ?1, updated_at = ?2 WHERE id = ?3",
            params![serialized, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn refresh_cards_count(&self, id: &str) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "UPDATE repositories SET
                 cards_count = (SELECT COUNT(*) FROM cards
                                WHERE repository_id = ?1 AND source_available = 1),
                 updated_at = ?2
             WHERE id = ?1",
            params![id, format_datetime(&Utc::now())],
        )?;

        conn.query_row(
            "SELECT cards_count FROM repositories WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(Error::NotFound)
    }

    // Card operations

    fn upsert_card(&self, card: &Card) -> Result<()> {
        let frontmatter = serde_json::to_string(&card.frontmatter).unwrap_or_else(|_| "{}".into());
        self.conn().execute(
            "INSERT INTO cards (id, repository_id, file_path, title, content, raw_content,
                 content_hash, frontmatter, source_available, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(repository_id, file_path) DO UPDATE SET
                 title = excluded.title,
                 content = excluded.content,
                 raw_content = excluded.raw_content,
                 content_hash = excluded.content_hash,
                 frontmatter = excluded.frontmatter,
                 source_available = excluded.source_available,
                 updated_at = excluded.updated_at",
            params![
                card.id,
                card.repository_id,
                card.file_path,
                card.title,
                card.content,
                card.raw_content,
                card.content_hash,
                frontmatter,
                card.source_available,
                format_datetime(&card.created_at),
                format_datetime(&card.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_card(&self, id: &str) -> Result<Option<Card>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1"),
            params![id],
            card_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_card_by_path(&self, repository_id: &str, file_path: &str) -> Result<Option<Card>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {CARD_COLUMNS} FROM cards WHERE repository_id = ?1 AND file_path = ?2"
            ),
            params![repository_id, file_path],
            card_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_cards(&self, repository_id: &str, include_removed: bool) -> Result<Vec<Card>> {
        let conn = self.conn();
        let sql = if include_removed {
            format!("SELECT {CARD_COLUMNS} FROM cards WHERE repository_id = ?1 ORDER BY file_path")
        } else {
            format!(
                "SELECT {CARD_COLUMNS} FROM cards
                 WHERE repository_id = ?1 AND source_available = 1 ORDER BY file_path"
            )
        };
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(params![repository_id], card_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn mark_card_unavailable(&self, repository_id: &str, file_path: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE cards SET source_available = 0, updated_at = ?1
             WHERE repository_id = ?2 AND file_path = ?3 AND source_available = 1",
            params![format_datetime(&Utc::now()), repository_id, file_path],
        )?;
        Ok(rows > 0)
    }

    fn update_card_content(&self, card_id: &str, content: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE cards SET content = ?1, updated_at = ?2 WHERE id = ?3",
            params![content, format_datetime(&Utc::now()), card_id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Card image operations

    fn upsert_card_image(&self, image: &CardImage) -> Result<()> {
        self.conn().execute(
            "INSERT INTO card_images (card_id, original_path, storage_path, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(card_id, original_path) DO UPDATE SET
                 storage_path = excluded.storage_path",
            params![
                image.card_id,
                image.original_path,
                image.storage_path,
                format_datetime(&image.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_card_image(&self, card_id: &str, original_path: &str) -> Result<Option<CardImage>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT card_id, original_path, storage_path, created_at
             FROM card_images WHERE card_id = ?1 AND original_path = ?2",
            params![card_id, original_path],
            |row| {
                Ok(CardImage {
                    card_id: row.get(0)?,
                    original_path: row.get(1)?,
                    storage_path: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_card_images(&self, card_id: &str) -> Result<Vec<CardImage>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT card_id, original_path, storage_path, created_at
             FROM card_images WHERE card_id = ?1 ORDER BY original_path",
        )?;

        let rows = stmt.query_map(params![card_id], |row| {
            Ok(CardImage {
                card_id: row.get(0)?,
                original_path: row.get(1)?,
                storage_path: row.get(2)?,
                created_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_card_image(&self, card_id: &str, original_path: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM card_images WHERE card_id = ?1 AND original_path = ?2",
            params![card_id, original_path],
        )?;
        Ok(rows > 0)
    }

    // Chunk buffer operations

    fn insert_chunk(&self, entry: &ChunkBufferEntry) -> Result<()> {
        // Redelivered fragments overwrite their earlier copy
        self.conn().execute(
            "INSERT INTO chunk_buffer (chunk_id, chunk_index, chunk_total, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(chunk_id, chunk_index) DO UPDATE SET
                 chunk_total = excluded.chunk_total,
                 content = excluded.content",
            params![
                entry.chunk_id,
                entry.chunk_index,
                entry.chunk_total,
                entry.content,
                format_datetime(&entry.created_at),
            ],
        )?;
        Ok(())
    }

    fn list_chunks(&self, chunk_id: &str) -> Result<Vec<ChunkBufferEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT chunk_id, chunk_index, chunk_total, content, created_at
             FROM chunk_buffer WHERE chunk_id = ?1 ORDER BY chunk_index",
        )?;

        let rows = stmt.query_map(params![chunk_id], |row| {
            Ok(ChunkBufferEntry {
                chunk_id: row.get(0)?,
                chunk_index: row.get(1)?,
                chunk_total: row.get(2)?,
                content: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_chunks(&self, chunk_id: &str) -> Result<usize> {
        let rows = self
            .conn()
            .execute("DELETE FROM chunk_buffer WHERE chunk_id = ?1", params![chunk_id])?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn test_repository(id: &str) -> Repository {
        Repository {
            id: id.to_string(),
            owner: "acme".to_string(),
            repo: "exercise-cards".to_string(),
            branch: "main".to_string(),
            access_token: None,
            external_id: Some("docora-1".to_string()),
            ignore_patterns: None,
            sync_status: SyncStatus::Pending,
            sync_error: None,
            last_commit_sha: None,
            last_commit_at: None,
            last_stats: SyncStats::default(),
            cards_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_card(repository_id: &str, path: &str) -> Card {
        Card {
            id: uuid::Uuid::new_v4().to_string(),
            repository_id: repository_id.to_string(),
            file_path: path.to_string(),
            title: "Squat".to_string(),
            content: "body".to_string(),
            raw_content: "body".to_string(),
            content_hash: "abc".to_string(),
            frontmatter: serde_json::Map::new(),
            source_available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = test_store();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"repositories".to_string()));
        assert!(tables.contains(&"cards".to_string()));
        assert!(tables.contains(&"card_images".to_string()));
        assert!(tables.contains(&"chunk_buffer".to_string()));
    }

    #[test]
    fn test_repository_crud() {
        let (_temp, store) = test_store();

        store.create_repository(&test_repository("repo-1")).unwrap();

        let fetched = store.get_repository("repo-1").unwrap().unwrap();
        assert_eq!(fetched.owner, "acme");
        assert_eq!(fetched.sync_status, SyncStatus::Pending);

        let by_external = store
            .get_repository_by_external_id("docora-1")
            .unwrap()
            .unwrap();
        assert_eq!(by_external.id, "repo-1");

        let by_source = store
            .get_repository_by_source("acme", "exercise-cards")
            .unwrap()
            .unwrap();
        assert_eq!(by_source.id, "repo-1");

        let duplicate = store.create_repository(&test_repository("repo-2"));
        assert!(matches!(duplicate, Err(Error::AlreadyExists)));

        assert!(store.delete_repository("repo-1").unwrap());
        assert!(store.get_repository("repo-1").unwrap().is_none());
    }

    #[test]
    fn test_sync_status_and_finish() {
        let (_temp, store) = test_store();
        store.create_repository(&test_repository("repo-1")).unwrap();

        store
            .update_sync_status("repo-1", SyncStatus::Syncing, None)
            .unwrap();
        let repo = store.get_repository("repo-1").unwrap().unwrap();
        assert_eq!(repo.sync_status, SyncStatus::Syncing);

        let stats = SyncStats {
            added: 2,
            updated: 1,
            removed: 0,
            unchanged: 3,
        };
        store
            .finish_sync("repo-1", &stats, "abc123", &Utc::now())
            .unwrap();
        let repo = store.get_repository("repo-1").unwrap().unwrap();
        assert_eq!(repo.sync_status, SyncStatus::Synced);
        assert_eq!(repo.last_stats, stats);
        assert_eq!(repo.last_commit_sha.as_deref(), Some("abc123"));

        store
            .update_sync_status("repo-1", SyncStatus::Error, Some("tree fetch failed"))
            .unwrap();
        let repo = store.get_repository("repo-1").unwrap().unwrap();
        assert_eq!(repo.sync_error.as_deref(), Some("tree fetch failed"));
    }

    #[test]
    fn test_try_begin_sync_is_exclusive() {
        let (_temp, store) = test_store();
        store.create_repository(&test_repository("repo-1")).unwrap();

        assert!(store.try_begin_sync("repo-1").unwrap());
        let repo = store.get_repository("repo-1").unwrap().unwrap();
        assert_eq!(repo.sync_status, SyncStatus::Syncing);

        // A second claim against the held row sees zero affected rows
        assert!(!store.try_begin_sync("repo-1").unwrap());
        assert!(!store.try_begin_sync("missing").unwrap());

        store
            .finish_sync("repo-1", &SyncStats::default(), "abc", &Utc::now())
            .unwrap();
        assert!(store.try_begin_sync("repo-1").unwrap());
    }

    #[test]
    fn test_ignore_patterns_roundtrip() {
        let (_temp, store) = test_store();
        store.create_repository(&test_repository("repo-1")).unwrap();

        let patterns = vec!["drafts/".to_string(), "*.tmp.md".to_string()];
        store
            .set_ignore_patterns("repo-1", Some(&patterns))
            .unwrap();
        let repo = store.get_repository("repo-1").unwrap().unwrap();
        assert_eq!(repo.ignore_patterns, Some(patterns));

        store.set_ignore_patterns("repo-1", None).unwrap();
        let repo = store.get_repository("repo-1").unwrap().unwrap();
        assert_eq!(repo.ignore_patterns, None);
    }

    #[test]
    fn test_card_upsert_keeps_identity() {
        let (_temp, store) = test_store();
        store.create_repository(&test_repository("repo-1")).unwrap();

        let card = test_card("repo-1", "legs/squat.md");
        store.upsert_card(&card).unwrap();

        let mut second = test_card("repo-1", "legs/squat.md");
        second.title = "Back Squat".to_string();
        second.content_hash = "def".to_string();
        store.upsert_card(&second).unwrap();

        let cards = store.list_cards("repo-1", true).unwrap();
        assert_eq!(cards.len(), 1);
        // The conflict update keeps the original row id
        assert_eq!(cards[0].id, card.id);
        assert_eq!(cards[0].title, "Back Squat");
        assert_eq!(cards[0].content_hash, "def");
    }

    #[test]
    fn test_soft_delete_keeps_content() {
        let (_temp, store) = test_store();
        store.create_repository(&test_repository("repo-1")).unwrap();
        store.upsert_card(&test_card("repo-1", "a.md")).unwrap();

        assert!(store.mark_card_unavailable("repo-1", "a.md").unwrap());
        // Already unavailable and missing paths are both no-ops
        assert!(!store.mark_card_unavailable("repo-1", "a.md").unwrap());
        assert!(!store.mark_card_unavailable("repo-1", "missing.md").unwrap());

        let card = store.get_card_by_path("repo-1", "a.md").unwrap().unwrap();
        assert!(!card.source_available);
        assert_eq!(card.raw_content, "body");
        assert_eq!(card.content_hash, "abc");

        assert!(store.list_cards("repo-1", false).unwrap().is_empty());
        assert_eq!(store.list_cards("repo-1", true).unwrap().len(), 1);
        assert_eq!(store.refresh_cards_count("repo-1").unwrap(), 0);
    }

    #[test]
    fn test_card_image_upsert() {
        let (_temp, store) = test_store();
        store.create_repository(&test_repository("repo-1")).unwrap();
        let card = test_card("repo-1", "a.md");
        store.upsert_card(&card).unwrap();

        let image = CardImage {
            card_id: card.id.clone(),
            original_path: "./diagrams/a.png".to_string(),
            storage_path: "acme/exercise-cards/0011223344556677.png".to_string(),
            created_at: Utc::now(),
        };
        store.upsert_card_image(&image).unwrap();

        let mut replaced = image.clone();
        replaced.storage_path = "acme/exercise-cards/8899aabbccddeeff.png".to_string();
        store.upsert_card_image(&replaced).unwrap();

        let images = store.list_card_images(&card.id).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].storage_path, replaced.storage_path);

        assert!(store
            .delete_card_image(&card.id, "./diagrams/a.png")
            .unwrap());
        assert!(!store
            .delete_card_image(&card.id, "./diagrams/a.png")
            .unwrap());
    }

    #[test]
    fn test_chunk_buffer_ordering() {
        let (_temp, store) = test_store();

        for index in [2, 0, 1] {
            store
                .insert_chunk(&ChunkBufferEntry {
                    chunk_id: "chunk-1".to_string(),
                    chunk_index: index,
                    chunk_total: 4,
                    content: format!("part{index}"),
                    created_at: Utc::now(),
                })
                .unwrap();
        }

        let chunks = store.list_chunks("chunk-1").unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content, "part0");
        assert_eq!(chunks[2].content, "part2");

        assert_eq!(store.delete_chunks("chunk-1").unwrap(), 3);
        assert!(store.list_chunks("chunk-1").unwrap().is_empty());
    }
}
