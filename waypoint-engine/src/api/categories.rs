use axum::{extract::State, routing::get, Json, Router};
use waypoint_common::MergedCategory;

use crate::{ApiResult, AppState};

/// GET /api/categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<MergedCategory>>> {
    Ok(Json(state.engine.list_merged_categories().await?))
}

pub fn category_routes() -> Router<AppState> {
    Router::new().route("/api/categories", get(list_categories))
}
