//! # Lumio
//!
//! The Lumio coaching server, usable both as a standalone binary and as a
//! library. Its core is the repository synchronization engine that mirrors
//! exercise reference cards (markdown + images) from external GitHub
//! repositories, through a full-tree pull sync and signed per-file webhook
//! events.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use lumio::github::GithubClient;
//! use lumio::server::{AppState, create_router};
//! use lumio::storage::FsObjectStorage;
//! use lumio::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/lumio.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     source: Arc::new(GithubClient::new()),
//!     objects: Arc::new(FsObjectStorage::new(
//!         &PathBuf::from("./data"),
//!         "http://localhost:8080",
//!     )),
//!     webhook_secret: "shared-secret".into(),
//!     webhook_app_id: None,
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod github;
pub mod server;
pub mod storage;
pub mod store;
pub mod sync;
pub mod types;
