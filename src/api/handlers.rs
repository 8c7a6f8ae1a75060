use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::{
        auth::{MaybeUser, RequireUser},
        session_id::SessionId,
    },
    models::{CatalogEntry, CatalogOrder, CatalogPage, CatalogQuery, ChatMessage, Comment},
    services::{catalog, chat},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub order: Option<CatalogOrder>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub series: Option<bool>,
    #[serde(default)]
    pub coming_soon: Option<bool>,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl From<BrowseParams> for CatalogQuery {
    fn from(params: BrowseParams) -> Self {
        Self {
            limit: params.limit.unwrap_or(0),
            order: params.order.unwrap_or_default(),
            category: params.category,
            is_series: params.series,
            coming_soon: params.coming_soon,
            cursor: params.cursor,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: ChatMessage,
    pub queries_used: u32,
    /// Absent for authenticated viewers, whose calls are unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_limit: Option<u32>,
    /// Set when the turn ran without catalog context; the UI shows a banner
    pub catalog_unavailable: bool,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Paginated, filterable catalog browse
pub async fn browse_catalog(
    State(state): State<AppState>,
    Query(params): Query<BrowseParams>,
) -> AppResult<Json<CatalogPage>> {
    let page = catalog::browse(state.store.clone(), params.into()).await?;
    Ok(Json(page))
}

/// Case-insensitive name search
pub async fn search_catalog(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    let matches =
        catalog::search(state.store.clone(), &params.q, params.limit.unwrap_or(24)).await?;
    Ok(Json(matches))
}

/// Single catalog entry
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<CatalogEntry>> {
    let entry = catalog::find(state.store.clone(), &id).await?;
    Ok(Json(entry))
}

/// Toggle the signed-in viewer's like on an entry
pub async fn toggle_like(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    Path(id): Path<String>,
) -> AppResult<Json<LikeResponse>> {
    let outcome = catalog::toggle_like(state.store.clone(), &id, &viewer.uid).await?;
    Ok(Json(LikeResponse {
        liked: outcome.liked,
        like_count: outcome.like_count,
    }))
}

/// Append a comment as the signed-in viewer
pub async fn add_comment(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    Path(id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment = catalog::add_comment(state.store.clone(), &id, &viewer, &request.text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Run one assistant turn for the caller's chat session
pub async fn chat(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    MaybeUser(viewer): MaybeUser,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::InvalidInput("Message cannot be empty".to_string()));
    }

    tracing::info!(
        session_id = %session_id,
        authenticated = viewer.is_some(),
        "Processing chat turn"
    );

    let session = state.chat_session(session_id.0).await;
    let turn = chat::respond(
        state.store.clone(),
        &session,
        &state.policy,
        message,
        viewer.as_ref(),
    )
    .await?;

    let query_limit = viewer.is_none().then_some(state.policy.guest_query_limit);

    Ok(Json(ChatResponse {
        message: turn.message,
        queries_used: turn.queries_used,
        query_limit,
        catalog_unavailable: turn.catalog_unavailable,
    }))
}
