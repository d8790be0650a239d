use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("sync already in progress")]
    SyncInProgress,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("source host error: {0}")]
    SourceHost(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("missing chunks for {chunk_id}: expected {expected} buffered, found {found}")]
    MissingChunks {
        chunk_id: String,
        expected: u32,
        found: u32,
    },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

pub type Result<T> = std::result::Result<T, Error>;
