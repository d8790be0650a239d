pub const SCHEMA: &str = r#"
-- External GitHub sources being mirrored
CREATE TABLE IF NOT EXISTS repositories (
    id TEXT PRIMARY KEY,
    owner TEXT NOT NULL,
    repo TEXT NOT NULL,
    branch TEXT NOT NULL DEFAULT 'main',

    -- Credential for private sources (nullable)
    access_token TEXT,

    -- Correlation id assigned by the Docora notification service
    external_id TEXT,

    -- Cached .lumioignore patterns as a JSON array, NULL = defaults only
    ignore_patterns TEXT,

    -- Sync state, written only by the orchestrators
    sync_status TEXT NOT NULL DEFAULT 'pending',
    sync_error TEXT,
    last_commit_sha TEXT,
    last_commit_at TEXT,
    last_added INTEGER NOT NULL DEFAULT 0,
    last_updated INTEGER NOT NULL DEFAULT 0,
    last_removed INTEGER NOT NULL DEFAULT 0,
    last_unchanged INTEGER NOT NULL DEFAULT 0,
    cards_count INTEGER NOT NULL DEFAULT 0,

    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(owner, repo)
);

-- Mirrored markdown files
CREATE TABLE IF NOT EXISTS cards (
    id TEXT PRIMARY KEY,
    repository_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    file_path TEXT NOT NULL,
    title TEXT NOT NULL,

    -- Rendered body (image refs rewritten) vs verbatim source
    content TEXT NOT NULL,
    raw_content TEXT NOT NULL,
    content_hash TEXT NOT NULL,

    -- Frontmatter metadata as a JSON object
    frontmatter TEXT NOT NULL DEFAULT '{}',

    -- 0 = file no longer present at the source; content is retained
    source_available INTEGER NOT NULL DEFAULT 1,

    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(repository_id, file_path)
);

-- Image reference -> content-addressed storage location, per card
CREATE TABLE IF NOT EXISTS card_images (
    card_id TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
    original_path TEXT NOT NULL,
    storage_path TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (card_id, original_path)
);

-- Buffered non-final fragments of chunked webhook payloads
CREATE TABLE IF NOT EXISTS chunk_buffer (
    chunk_id TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    chunk_total INTEGER NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (chunk_id, chunk_index)
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_repositories_external ON repositories(external_id);
CREATE INDEX IF NOT EXISTS idx_cards_repository ON cards(repository_id);
CREATE INDEX IF NOT EXISTS idx_card_images_storage ON card_images(storage_path);
"#;
