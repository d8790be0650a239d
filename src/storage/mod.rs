mod fs;

pub use fs::FsObjectStorage;

use async_trait::async_trait;

use crate::error::Result;

/// Content-addressed binary storage, keyed by
/// `{owner}/{repository}/{hash}.{ext}`. Uploads are upload-or-overwrite:
/// identical bytes always land at the same key, so re-syncing an unchanged
/// binary never duplicates an object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn delete(&self, key: &str) -> Result<bool>;
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Resolve the public URL a rendered card should reference for a key.
    fn public_url(&self, key: &str) -> String;
}
