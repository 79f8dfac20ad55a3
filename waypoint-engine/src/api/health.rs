//! Health check endpoint
//!
//! Reports whether the store answers, with active entity counts when it does.
//! An unreachable store turns the response into a 503.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use waypoint_common::models::EntityKind;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreHealth {
    Reachable {
        active_entities: i64,
        by_kind: BTreeMap<EntityKind, i64>,
    },
    Unreachable {
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the store does not answer
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub store: StoreHealth,
    /// Most recent server-side failure seen by a handler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let uptime_seconds = Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds()
        .max(0) as u64;

    let (status, store) = match state.engine.stats().await {
        Ok(stats) => (
            StatusCode::OK,
            StoreHealth::Reachable {
                active_entities: stats.total,
                by_kind: stats.by_kind,
            },
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                StoreHealth::Unreachable { error: e.to_string() },
            )
        }
    };

    let response = HealthResponse {
        status: if status.is_success() { "ok" } else { "degraded" },
        module: "waypoint-engine",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds,
        store,
        last_error: state.last_error.read().await.clone(),
    };
    (status, Json(response))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
