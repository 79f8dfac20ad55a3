//! Quiz endpoint

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use waypoint_common::QuizAnswers;

use crate::services::QuizResolution;
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    pub answers: QuizAnswers,
}

/// POST /api/quiz/:quiz_type
pub async fn submit_quiz(
    State(state): State<AppState>,
    Path(quiz_type): Path<String>,
    Json(request): Json<QuizRequest>,
) -> ApiResult<Json<QuizResolution>> {
    match state.engine.resolve_quiz_result(&request.answers, &quiz_type).await {
        Ok(resolution) => Ok(Json(resolution)),
        Err(e) => Err(state.fail(e).await),
    }
}

pub fn quiz_routes() -> Router<AppState> {
    Router::new().route("/api/quiz/:quiz_type", post(submit_quiz))
}
