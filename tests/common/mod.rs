#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use lumio::error::{Error, Result};
use lumio::github::{CommitRef, SourceHost, TreeEntry};
use lumio::server::{AppState, create_router};
use lumio::storage::FsObjectStorage;
use lumio::store::{SqliteStore, Store};
use lumio::types::{Repository, SyncStats, SyncStatus};

pub const SECRET: &str = "test-webhook-secret";
pub const APP_ID: &str = "docora-test-app";

/// In-memory stand-in for the GitHub API.
#[derive(Default)]
pub struct StaticSource {
    commit_sha: Mutex<String>,
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl StaticSource {
    pub fn set_commit(&self, sha: &str) {
        *self.commit_sha.lock().unwrap() = sha.to_string();
    }

    pub fn put_file(&self, path: &str, data: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
    }

    pub fn remove_file(&self, path: &str) {
        self.files.lock().unwrap().remove(path);
    }
}

#[async_trait]
impl SourceHost for StaticSource {
    async fn latest_commit(&self, _repo: &Repository) -> Result<CommitRef> {
        Ok(CommitRef {
            sha: self.commit_sha.lock().unwrap().clone(),
            committed_at: Utc::now(),
        })
    }

    async fn tree(&self, _repo: &Repository, _commit_sha: &str) -> Result<Vec<TreeEntry>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .map(|path| TreeEntry {
                path: path.clone(),
                sha: format!("blob-{path}"),
            })
            .collect())
    }

    async fn fetch_text(&self, _repo: &Repository, path: &str) -> Result<String> {
        let files = self.files.lock().unwrap();
        let data = files
            .get(path)
            .ok_or_else(|| Error::SourceHost(format!("missing {path}")))?;
        String::from_utf8(data.clone()).map_err(|e| Error::SourceHost(e.to_string()))
    }

    async fn fetch_bytes(&self, _repo: &Repository, path: &str) -> Result<Vec<u8>> {
        let files = self.files.lock().unwrap();
        files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::SourceHost(format!("missing {path}")))
    }
}

/// A fully-wired application served in process.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<SqliteStore>,
    pub source: Arc<StaticSource>,
    _temp: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let store = Arc::new(SqliteStore::new(temp.path().join("test.db")).expect("open store"));
        store.initialize().expect("initialize schema");

        let source = Arc::new(StaticSource::default());
        source.set_commit("commit-1");

        let objects = Arc::new(FsObjectStorage::new(temp.path(), "http://localhost:8080"));

        let state = Arc::new(AppState {
            store: store.clone(),
            source: source.clone(),
            objects,
            webhook_secret: SECRET.to_string(),
            webhook_app_id: Some(APP_ID.to_string()),
        });

        Self {
            router: create_router(state),
            store,
            source,
            _temp: temp,
        }
    }

    /// Register a repository directly in the store and return its id.
    pub fn add_repository(&self, owner: &str, repo: &str, external_id: Option<&str>) -> String {
        let now = Utc::now();
        let repository = Repository {
            id: format!("repo-{owner}-{repo}"),
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: "main".to_string(),
            access_token: None,
            external_id: external_id.map(ToString::to_string),
            ignore_patterns: None,
            sync_status: SyncStatus::Pending,
            sync_error: None,
            last_commit_sha: None,
            last_commit_at: None,
            last_stats: SyncStats::default(),
            cards_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.store
            .create_repository(&repository)
            .expect("create repository");
        repository.id
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("route request");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("build request");
        self.request(request).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request");
        self.request(request).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("DELETE")
            .uri(path)
            .body(Body::empty())
            .expect("build request");
        self.request(request).await
    }

    /// Deliver a correctly signed Docora file event.
    pub async fn webhook(&self, action: &str, payload: &Value) -> (StatusCode, Value) {
        self.webhook_signed(action, payload, Utc::now().timestamp(), SECRET, Some(APP_ID))
            .await
    }

    /// Deliver a file event with full control over signing inputs.
    pub async fn webhook_signed(
        &self,
        action: &str,
        payload: &Value,
        timestamp: i64,
        secret: &str,
        app_id: Option<&str>,
    ) -> (StatusCode, Value) {
        let body = payload.to_string();
        let signature = lumio::auth::sign_payload(body.as_bytes(), timestamp, secret);

        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/webhooks/docora/files/{action}"))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-docora-signature", signature)
            .header("x-docora-timestamp", timestamp.to_string());
        if let Some(app_id) = app_id {
            builder = builder.header("x-docora-app-id", app_id);
        }

        let request = builder.body(Body::from(body)).expect("build request");
        self.request(request).await
    }
}
