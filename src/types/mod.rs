mod models;

pub use models::{Card, CardImage, ChunkBufferEntry, Repository, SyncStats, SyncStatus};
