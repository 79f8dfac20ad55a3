//! Roadmap and soft skill endpoints
//!
//! - `POST /api/roadmaps`, `POST /api/skills`: resolve or create by name
//! - `GET /api/roadmaps/:slug`, `GET /api/skills/:slug`: lookup only
//! - `POST /api/roadmaps/:slug_or_id/view`: fire-and-forget view count
//! - `DELETE /api/roadmaps/:id`: soft delete, `?hard=true` removes the row
//! - `GET /api/stats`: active entity counts

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use waypoint_common::models::{Entity, EntityKind};

use crate::services::{EntityStats, ResolutionOutcome, Resolved};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub entity: Entity,
    pub outcome: ResolutionOutcome,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub hard: bool,
}

/// POST /api/roadmaps
pub async fn resolve_roadmap(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> ApiResult<impl IntoResponse> {
    let resolved = match state.engine.resolve_or_create_roadmap(&request.name).await {
        Ok(resolved) => resolved,
        Err(e) => return Err(state.fail(e).await),
    };
    Ok(resolve_response(resolved))
}

/// POST /api/skills
pub async fn resolve_skill(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> ApiResult<impl IntoResponse> {
    let resolved = match state.engine.resolve_or_create_skill(&request.name).await {
        Ok(resolved) => resolved,
        Err(e) => return Err(state.fail(e).await),
    };
    Ok(resolve_response(resolved))
}

fn resolve_response(resolved: Resolved) -> (StatusCode, Json<ResolveResponse>) {
    let status = match resolved.outcome {
        ResolutionOutcome::Created => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    (
        status,
        Json(ResolveResponse {
            entity: resolved.entity,
            outcome: resolved.outcome,
        }),
    )
}

/// GET /api/roadmaps/:slug
pub async fn get_roadmap(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Entity>> {
    lookup(&state, EntityKind::Career, &slug).await
}

/// GET /api/skills/:slug
pub async fn get_skill(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Entity>> {
    lookup(&state, EntityKind::SoftSkill, &slug).await
}

async fn lookup(state: &AppState, kind: EntityKind, slug: &str) -> ApiResult<Json<Entity>> {
    state
        .engine
        .get_roadmap(kind, slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No {} with slug '{}'", kind, slug)))
}

/// POST /api/roadmaps/:slug_or_id/view
///
/// Responds immediately; the increment runs detached and its failure is only
/// logged.
pub async fn record_view(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
) -> StatusCode {
    tokio::spawn(async move {
        match state.engine.record_view(&slug_or_id).await {
            Ok(true) => tracing::debug!(key = %slug_or_id, "View recorded"),
            Ok(false) => tracing::debug!(key = %slug_or_id, "View for unknown entity ignored"),
            Err(e) => {
                tracing::warn!(key = %slug_or_id, error = %e, "Failed to record view");
                state.note_error(format!("record_view: {}", e)).await;
            }
        }
    });

    StatusCode::ACCEPTED
}

/// DELETE /api/roadmaps/:id
pub async fn delete_roadmap(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> ApiResult<StatusCode> {
    let removed = if params.hard {
        state.engine.delete(id).await?
    } else {
        state.engine.deactivate(id).await?
    };

    if removed {
        tracing::info!(id = %id, hard = params.hard, "Roadmap deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("No entity with id {}", id)))
    }
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<EntityStats>> {
    Ok(Json(state.engine.stats().await?))
}

/// Build roadmap and skill routes
pub fn roadmap_routes() -> Router<AppState> {
    Router::new()
        .route("/api/roadmaps", post(resolve_roadmap))
        .route("/api/roadmaps/:key", get(get_roadmap).delete(delete_roadmap))
        .route("/api/roadmaps/:key/view", post(record_view))
        .route("/api/skills", post(resolve_skill))
        .route("/api/skills/:slug", get(get_skill))
        .route("/api/stats", get(stats))
}
