use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use super::router::AppState;
use crate::error::Error;
use crate::sync::PullSync;
use crate::types::{Card, Repository, SyncStats, SyncStatus};

#[derive(Debug, Deserialize)]
pub struct CreateRepositoryRequest {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TriggerSyncRequest {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct SyncTriggerResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SyncStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCardsParams {
    #[serde(default)]
    pub include_removed: bool,
}

const MAX_SOURCE_NAME_LEN: usize = 100;

fn validate_source_name(name: &str, entity: &str) -> Result<(), ApiError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_SOURCE_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !name.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "{entity} must be a valid GitHub name"
        )))
    }
}

async fn create_repository(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRepositoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_source_name(&req.owner, "owner")?;
    validate_source_name(&req.repo, "repo")?;

    let now = Utc::now();
    let repository = Repository {
        id: Uuid::new_v4().to_string(),
        owner: req.owner,
        repo: req.repo,
        branch: req.branch.unwrap_or_else(|| "main".to_string()),
        access_token: req.access_token,
        external_id: req.external_id,
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

    match state.store.create_repository(&repository) {
        Ok(()) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(repository)),
        )),
        Err(Error::AlreadyExists) => Err(ApiError::conflict("Repository already registered")),
        Err(_) => Err(ApiError::internal("Failed to create repository")),
    }
}

async fn list_repositories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let repositories = state
        .store
        .list_repositories()
        .api_err("Failed to list repositories")?;
    Ok(Json(ApiResponse::success(repositories)))
}

async fn get_repository(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let repository = state
        .store
        .get_repository(&id)
        .api_err("Failed to get repository")?
        .or_not_found("Repository not found")?;
    Ok(Json(ApiResponse::success(repository)))
}

async fn delete_repository(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .store
        .delete_repository(&id)
        .api_err("Failed to delete repository")?;
    if !deleted {
        return Err(ApiError::not_found("Repository not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn trigger_sync(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<TriggerSyncRequest>>,
) -> Result<Response, ApiError> {
    let Json(req) = body.unwrap_or_default();

    let sync = PullSync::new(&*state.store, &*state.source, &*state.objects);
    match sync.run(&id, req.force).await {
        Ok(report) => Ok(Json(SyncTriggerResponse {
            success: true,
            stats: Some(report.stats),
            cards_count: Some(report.cards_count),
            commit_sha: Some(report.commit_sha),
            last_commit_at: Some(report.commit_at),
            error: None,
        })
        .into_response()),
        Err(Error::NotFound) => Err(ApiError::not_found("Repository not found")),
        Err(Error::SyncInProgress) => Err(ApiError::conflict("Sync already in progress")),
        Err(e) => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SyncTriggerResponse {
                success: false,
                stats: None,
                cards_count: None,
                commit_sha: None,
                last_commit_at: None,
                error: Some(e.to_string()),
            }),
        )
            .into_response()),
    }
}

async fn list_cards(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ListCardsParams>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .get_repository(&id)
        .api_err("Failed to get repository")?
        .or_not_found("Repository not found")?;

    let cards: Vec<Card> = state
        .store
        .list_cards(&id, params.include_removed)
        .api_err("Failed to list cards")?;
    Ok(Json(ApiResponse::success(cards)))
}

async fn get_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let card = state
        .store
        .get_card(&id)
        .api_err("Failed to get card")?
        .or_not_found("Card not found")?;
    Ok(Json(ApiResponse::success(card)))
}

pub fn repos_router() -> axum::Router<Arc<AppState>> {
    axum::Router::new()
        .route("/repositories", post(create_repository).get(list_repositories))
        .route(
            "/repositories/{id}",
            get(get_repository).delete(delete_repository),
        )
        .route("/repositories/{id}/sync", post(trigger_sync))
        .route("/repositories/{id}/cards", get(list_cards))
        .route("/cards/{id}", get(get_card))
}
