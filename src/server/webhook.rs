//! The Docora push-sync receiver.
//!
//! Docora delivers one signed file event per call, in no guaranteed order.
//! The handler validates headers and signature over the raw body before any
//! state mutation, reassembles chunked payloads, and drives the reconciler
//! for exactly one file. Acknowledgements (200) cover buffered chunks and
//! ignored paths too; only auth, lookup, and malformed-input failures are
//! surfaced as errors.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use super::router::AppState;
use crate::auth::verify_signature;
use crate::error::Error;
use crate::sync::chunks::{self, ChunkInfo, ChunkOutcome};
use crate::sync::reconcile::{Reconciler, is_image_path, is_markdown_path};
use crate::sync::{IGNORE_FILE, ignore};
use crate::types::Repository;

pub const HEADER_APP_ID: &str = "x-docora-app-id";
pub const HEADER_SIGNATURE: &str = "x-docora-signature";
pub const HEADER_TIMESTAMP: &str = "x-docora-timestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileAction {
    Create,
    Update,
    Delete,
}

impl FromStr for FileAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(FileAction::Create),
            "update" => Ok(FileAction::Update),
            "delete" => Ok(FileAction::Delete),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub repository: WebhookRepository,
    pub file: WebhookFile,
    #[serde(default)]
    pub commit_sha: Option<String>,
    #[serde(default)]
    pub previous_sha: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookRepository {
    pub repository_id: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookFile {
    pub path: String,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_encoding: Option<String>,
    #[serde(default)]
    pub chunk: Option<ChunkInfo>,
}

#[derive(Debug, Serialize)]
struct WebhookAck {
    path: String,
    result: &'static str,
}

fn ack(path: &str, result: &'static str) -> Json<ApiResponse<WebhookAck>> {
    Json(ApiResponse::success(WebhookAck {
        path: path.to_string(),
        result,
    }))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn decode_base64(content: &str) -> Result<Vec<u8>, ApiError> {
    let compact: String = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact)
        .map_err(|_| ApiError::bad_request("Invalid base64 content"))
}

fn decode_text(content: &str, encoding: Option<&str>) -> Result<String, ApiError> {
    match encoding {
        Some("base64") => String::from_utf8(decode_base64(content)?)
            .map_err(|_| ApiError::bad_request("Content is not valid UTF-8")),
        _ => Ok(content.to_string()),
    }
}

fn decode_bytes(content: &str, encoding: Option<&str>) -> Result<Vec<u8>, ApiError> {
    match encoding {
        Some("base64") => decode_base64(content),
        _ => Ok(content.as_bytes().to_vec()),
    }
}

async fn receive_file_event(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let action: FileAction = action
        .parse()
        .map_err(|()| ApiError::bad_request("Unknown file action"))?;

    let app_id = header_str(&headers, HEADER_APP_ID)
        .ok_or_else(|| ApiError::unauthorized("Missing application id header"))?;
    if let Some(expected) = &state.webhook_app_id {
        if app_id != expected {
            return Err(ApiError::forbidden("Unknown application id"));
        }
    }
    let signature = header_str(&headers, HEADER_SIGNATURE)
        .ok_or_else(|| ApiError::unauthorized("Missing signature header"))?;
    let timestamp = header_str(&headers, HEADER_TIMESTAMP)
        .ok_or_else(|| ApiError::unauthorized("Missing timestamp header"))?;

    if !verify_signature(&body, signature, timestamp, &state.webhook_secret) {
        return Err(ApiError::unauthorized("Invalid signature"));
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Malformed payload: {e}")))?;

    // Webhooks never create repositories; unknown correlation ids are a 404
    let repo = state
        .store
        .get_repository_by_external_id(&payload.repository.repository_id)
        .api_err("Failed to look up repository")?
        .or_not_found("Unknown repository")?;

    let path = payload.file.path.trim_start_matches('/').to_string();
    tracing::info!(
        "webhook {action:?} for {}/{}: {path}",
        repo.owner,
        repo.repo
    );

    let response = match action {
        FileAction::Delete => handle_delete(&state, &repo, &path).await?,
        FileAction::Create | FileAction::Update => {
            handle_upsert(&state, &repo, &path, &payload.file).await?
        }
    };

    state
        .store
        .refresh_cards_count(&repo.id)
        .api_err("Failed to refresh card count")?;

    Ok(response)
}

async fn handle_delete(
    state: &AppState,
    repo: &Repository,
    path: &str,
) -> Result<Json<ApiResponse<WebhookAck>>, ApiError> {
    if path == IGNORE_FILE {
        // Deleting the ignore file falls back to the built-in defaults
        state
            .store
            .set_ignore_patterns(&repo.id, None)
            .api_err("Failed to reset ignore patterns")?;
        return Ok(ack(path, "ignore patterns reset"));
    }

    let reconciler = Reconciler::new(&*state.store, &*state.objects);
    if is_markdown_path(path) {
        let removed = reconciler
            .delete_card(repo, path)
            .api_err("Failed to delete card")?;
        Ok(ack(path, if removed { "removed" } else { "not present" }))
    } else if is_image_path(path) {
        reconciler
            .delete_image(repo, path)
            .await
            .api_err("Failed to delete image")?;
        Ok(ack(path, "image removed"))
    } else {
        Ok(ack(path, "skipped"))
    }
}

async fn handle_upsert(
    state: &AppState,
    repo: &Repository,
    path: &str,
    file: &WebhookFile,
) -> Result<Json<ApiResponse<WebhookAck>>, ApiError> {
    let content = file
        .content
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Missing file content"))?;

    let assembled = match chunks::process(&*state.store, file.chunk.as_ref(), content) {
        Ok(ChunkOutcome::Complete(assembled)) => assembled,
        Ok(ChunkOutcome::Buffered) => return Ok(ack(path, "chunk buffered")),
        Err(e @ Error::MissingChunks { .. }) => {
            return Err(ApiError::bad_request(e.to_string()));
        }
        Err(Error::InvalidPayload(message)) => {
            return Err(ApiError::bad_request(message));
        }
        Err(_) => return Err(ApiError::internal("Chunk reassembly failed")),
    };

    let encoding = file.content_encoding.as_deref();

    if path == IGNORE_FILE {
        // The ignore file updates the pattern cache but never becomes a card
        let text = decode_text(&assembled, encoding)?;
        let patterns = ignore::parse_patterns(&text);
        state
            .store
            .set_ignore_patterns(&repo.id, Some(&patterns))
            .api_err("Failed to update ignore patterns")?;
        return Ok(ack(path, "ignore patterns updated"));
    }

    let patterns = repo.ignore_patterns.clone().unwrap_or_default();
    if ignore::is_ignored(path, &patterns) {
        return Ok(ack(path, "ignored"));
    }

    let reconciler = Reconciler::new(&*state.store, &*state.objects);
    if is_markdown_path(path) {
        let text = decode_text(&assembled, encoding)?;
        let outcome = reconciler
            .upsert_markdown(repo, path, &text)
            .await
            .api_err("Failed to reconcile card")?;
        Ok(ack(
            path,
            match outcome {
                crate::sync::Outcome::Added => "added",
                crate::sync::Outcome::Updated => "updated",
                crate::sync::Outcome::Unchanged => "unchanged",
            },
        ))
    } else if is_image_path(path) {
        let data = decode_bytes(&assembled, encoding)?;
        reconciler
            .upsert_image(repo, path, &data)
            .await
            .api_err("Failed to reconcile image")?;
        Ok(ack(path, "image stored"))
    } else {
        Ok(ack(path, "skipped"))
    }
}

pub fn webhook_router() -> axum::Router<Arc<AppState>> {
    axum::Router::new().route("/files/{action}", post(receive_file_event))
}
