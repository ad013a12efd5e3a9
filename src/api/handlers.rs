use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CatalogueItem, ItemId, Vote};
use crate::services::{Catalogue, ComparisonPair, Recommendations, SessionPhase, SessionSnapshot};

use super::state::SessionEntry;
use super::AppState;

const DEFAULT_RECOMMENDATIONS: usize = 10;
const MAX_RECOMMENDATIONS: usize = 100;

// Request/Response types

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state: SessionSnapshot,
}

impl SessionResponse {
    fn new(id: Uuid, entry: &SessionEntry) -> Self {
        Self {
            id,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            state: entry.controller.snapshot(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogueResponse {
    pub items: usize,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub phase: SessionPhase,
    pub state: SessionSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct ExplorationRequest {
    pub delta: f64,
}

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub item_id: ItemId,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub k: Option<usize>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Get the catalogue served to new sessions
pub async fn get_catalogue(State(state): State<AppState>) -> Json<Vec<CatalogueItem>> {
    let inner = state.inner.read().await;
    Json(inner.catalogue.items().to_vec())
}

/// Replace the catalogue for sessions created from now on
pub async fn replace_catalogue(
    State(state): State<AppState>,
    Json(items): Json<Vec<CatalogueItem>>,
) -> AppResult<Json<CatalogueResponse>> {
    if items.len() < 2 {
        return Err(AppError::InvalidInput(
            "Catalogue needs at least two items".to_string(),
        ));
    }

    let catalogue = Catalogue::new(items);
    let response = CatalogueResponse {
        items: catalogue.len(),
    };

    let mut inner = state.inner.write().await;
    inner.replace_catalogue(catalogue);

    tracing::info!(items = response.items, "Catalogue replaced");

    Ok(Json(response))
}

/// Start an onboarding session; the body (and its seed) is optional
pub async fn create_session(
    State(state): State<AppState>,
    request: Option<Json<CreateSessionRequest>>,
) -> (StatusCode, Json<SessionResponse>) {
    let seed = request.and_then(|Json(r)| r.seed);

    let mut inner = state.inner.write().await;
    let (id, entry) = inner.create_session(&state.engine, seed);
    let response = SessionResponse::new(id, entry);

    tracing::info!(session_id = %id, seed = entry.controller.seed(), "Session created");

    (StatusCode::CREATED, Json(response))
}

/// Current weights and onboarding progress
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionResponse>> {
    let inner = state.inner.read().await;
    let entry = inner.session(&id)?;
    Ok(Json(SessionResponse::new(id, entry)))
}

/// Drop a session and everything it learned
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut inner = state.inner.write().await;
    inner
        .sessions
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("session {}", id)))?;

    tracing::info!(session_id = %id, "Session deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Next pair to compare
pub async fn next_pair(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ComparisonPair>> {
    let mut inner = state.inner.write().await;
    let entry = inner.session_mut(&id)?;
    let pair = entry.controller.next_pair()?;
    entry.touch();
    Ok(Json(pair))
}

/// Record a forced-choice vote
pub async fn submit_vote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(vote): Json<Vote>,
) -> AppResult<Json<VoteResponse>> {
    let mut inner = state.inner.write().await;
    let entry = inner.session_mut(&id)?;

    let phase = entry.controller.submit_vote(&vote).map_err(|e| {
        tracing::warn!(session_id = %id, error = %e, "Vote rejected");
        e
    })?;
    entry.touch();

    tracing::info!(
        session_id = %id,
        winner = %vote.winner_id,
        loser = %vote.loser_id,
        "Vote recorded"
    );

    Ok(Json(VoteResponse {
        phase,
        state: entry.controller.snapshot(),
    }))
}

/// Undo one round and get a fresh pair
pub async fn skip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ComparisonPair>> {
    let mut inner = state.inner.write().await;
    let entry = inner.session_mut(&id)?;
    let pair = entry.controller.skip()?;
    entry.touch();
    Ok(Json(pair))
}

/// Nudge the exploration rate
pub async fn adjust_exploration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ExplorationRequest>,
) -> AppResult<Json<SessionSnapshot>> {
    if !request.delta.is_finite() {
        return Err(AppError::InvalidInput("delta must be finite".to_string()));
    }

    let mut inner = state.inner.write().await;
    let entry = inner.session_mut(&id)?;
    let rate = entry.controller.adjust_exploration(request.delta);
    entry.touch();

    tracing::debug!(session_id = %id, exploration_rate = rate, "Exploration adjusted");

    Ok(Json(entry.controller.snapshot()))
}

/// Start over from round zero
pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionSnapshot>> {
    let mut inner = state.inner.write().await;
    let entry = inner.session_mut(&id)?;
    entry.controller.reset();
    entry.touch();

    tracing::info!(session_id = %id, "Session reset");

    Ok(Json(entry.controller.snapshot()))
}

/// Stop serving an item to this session
pub async fn hide(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ItemRequest>,
) -> AppResult<Json<SessionSnapshot>> {
    let mut inner = state.inner.write().await;
    let entry = inner.session_mut(&id)?;
    entry.controller.hide(&request.item_id)?;
    entry.touch();
    Ok(Json(entry.controller.snapshot()))
}

/// Allow a hidden item again
pub async fn unhide(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ItemRequest>,
) -> AppResult<Json<SessionSnapshot>> {
    let mut inner = state.inner.write().await;
    let entry = inner.session_mut(&id)?;
    entry.controller.unhide(&request.item_id)?;
    entry.touch();
    Ok(Json(entry.controller.snapshot()))
}

/// Remember a liked item
pub async fn like(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ItemRequest>,
) -> AppResult<Json<SessionSnapshot>> {
    let mut inner = state.inner.write().await;
    let entry = inner.session_mut(&id)?;
    entry.controller.like(&request.item_id)?;
    entry.touch();
    Ok(Json(entry.controller.snapshot()))
}

/// Ranked, diversified recommendations with a short rationale
pub async fn recommendations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<Recommendations>> {
    let k = query.k.unwrap_or(DEFAULT_RECOMMENDATIONS);
    if k == 0 || k > MAX_RECOMMENDATIONS {
        return Err(AppError::InvalidInput(format!(
            "k must be between 1 and {}",
            MAX_RECOMMENDATIONS
        )));
    }

    let mut inner = state.inner.write().await;
    let entry = inner.session_mut(&id)?;
    let recommendations = entry.controller.recommendations(k);

    tracing::info!(
        session_id = %id,
        requested = k,
        served = recommendations.items.len(),
        onboarding_complete = entry.controller.is_complete(),
        "Recommendations served"
    );

    Ok(Json(recommendations))
}
