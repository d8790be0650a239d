//! Filesystem-backed object storage for locally-hosted deployments.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::ObjectStore;
use crate::error::{Error, Result};

/// Optional hook rewriting resolved URLs after upload. Deployments behind a
/// separate public hostname use this to swap the internal host out.
pub type UrlRewriteFn = dyn Fn(String) -> String + Send + Sync;

pub struct FsObjectStorage {
    base_path: PathBuf,
    public_base_url: String,
    url_rewrite: Option<Box<UrlRewriteFn>>,
}

impl FsObjectStorage {
    pub fn new(data_dir: &std::path::Path, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path: data_dir.join("objects"),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            url_rewrite: None,
        }
    }

    #[must_use]
    pub fn with_url_rewrite(
        mut self,
        rewrite: impl Fn(String) -> String + Send + Sync + 'static,
    ) -> Self {
        self.url_rewrite = Some(Box::new(rewrite));
        self
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path.join("tmp").join(Uuid::new_v4().to_string())
    }
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && !key.split('/').any(|segment| {
            segment.is_empty() || segment == "." || segment == ".."
        });
    if valid {
        Ok(())
    } else {
        Err(Error::Storage(format!("invalid object key: {key}")))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStorage {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let final_path = self.object_path(key)?;

        let temp_path = self.temp_path();
        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut temp_file = File::create(&temp_path).await?;
        temp_file.write_all(data).await?;
        temp_file.sync_all().await?;

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(&temp_path, &final_path).await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.object_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key)?;
        Ok(path.exists())
    }

    fn public_url(&self, key: &str) -> String {
        let url = format!("{}/objects/{key}", self.public_base_url);
        match &self.url_rewrite {
            Some(rewrite) => rewrite(url),
            None => url,
        }
    }
}
