use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{MediaItem, MediaType, PreferenceRecord, SignalKind};
use crate::services::catalog::TrendingWindow;
use crate::services::engine::SINGLE_TYPE_CAP;
use crate::services::preferences as preference_ops;

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    #[serde(default)]
    pub media_type: MediaType,
}

#[derive(Debug, Deserialize)]
pub struct MultiRecommendationRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SignalRequest {
    pub user_id: String,
    pub media_type: MediaType,
    pub media_id: String,
}

#[derive(Debug, Serialize)]
pub struct AddSignalResponse {
    pub added: bool,
}

#[derive(Debug, Serialize)]
pub struct RemoveSignalResponse {
    pub removed: bool,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default = "default_trending_limit")]
    pub limit: usize,
}

fn default_trending_limit() -> usize {
    10
}

fn require_user_id(user_id: &str) -> AppResult<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "user_id cannot be empty".to_string(),
        ));
    }
    Ok(())
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Single-type recommendations. Responds NotFound (code NoSignal) when the
/// user has no liked signal for the requested type. The engine runs under
/// the configured request timeout and salvages partial results on expiry.
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<MediaItem>>> {
    require_user_id(&request.user_id)?;

    let items = state
        .engine
        .recommend_for_user(
            &request.user_id,
            request.media_type,
            SINGLE_TYPE_CAP,
            state.request_timeout,
        )
        .await?;

    Ok(Json(items))
}

/// Multi-type recommendations. Always answers with all four media types;
/// types without signal carry trending entries instead.
pub async fn recommend_multi(
    State(state): State<AppState>,
    Json(request): Json<MultiRecommendationRequest>,
) -> AppResult<Json<HashMap<MediaType, Vec<MediaItem>>>> {
    require_user_id(&request.user_id)?;

    let aggregate = state.aggregator.recommend_all(&request.user_id).await;
    Ok(Json(aggregate))
}

/// Record a like
pub async fn add_like(
    state: State<AppState>,
    request: Json<SignalRequest>,
) -> AppResult<Json<AddSignalResponse>> {
    add_signal(state, request, SignalKind::Liked).await
}

/// Record a dislike
pub async fn add_dislike(
    state: State<AppState>,
    request: Json<SignalRequest>,
) -> AppResult<Json<AddSignalResponse>> {
    add_signal(state, request, SignalKind::Disliked).await
}

async fn add_signal(
    State(state): State<AppState>,
    Json(request): Json<SignalRequest>,
    kind: SignalKind,
) -> AppResult<Json<AddSignalResponse>> {
    require_user_id(&request.user_id)?;

    let added = preference_ops::record_signal(
        &state.preferences,
        &request.user_id,
        kind,
        request.media_type,
        &request.media_id,
    )
    .await?;

    Ok(Json(AddSignalResponse { added }))
}

/// Remove a like
pub async fn remove_like(
    state: State<AppState>,
    request: Json<SignalRequest>,
) -> AppResult<Json<RemoveSignalResponse>> {
    remove_signal(state, request, SignalKind::Liked).await
}

/// Remove a dislike
pub async fn remove_dislike(
    state: State<AppState>,
    request: Json<SignalRequest>,
) -> AppResult<Json<RemoveSignalResponse>> {
    remove_signal(state, request, SignalKind::Disliked).await
}

async fn remove_signal(
    State(state): State<AppState>,
    Json(request): Json<SignalRequest>,
    kind: SignalKind,
) -> AppResult<Json<RemoveSignalResponse>> {
    require_user_id(&request.user_id)?;

    let removed = preference_ops::clear_signal(
        &state.preferences,
        &request.user_id,
        kind,
        request.media_type,
        &request.media_id,
    )
    .await?;

    Ok(Json(RemoveSignalResponse { removed }))
}

/// Full preference record for a user; an empty record when none exists
pub async fn get_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<PreferenceRecord>> {
    require_user_id(&user_id)?;

    let record = state.preferences.get(&user_id).await?.unwrap_or_default();
    Ok(Json(record))
}

/// Currently trending items for one media type
pub async fn trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingQuery>,
) -> AppResult<Json<Vec<MediaItem>>> {
    let catalog = state.catalogs.for_type(params.media_type);
    let items = catalog
        .get_trending(TrendingWindow::Day, params.limit)
        .await?;
    Ok(Json(items))
}
