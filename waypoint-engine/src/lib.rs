//! waypoint-engine library interface
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::services::RoadmapEngine;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RoadmapEngine>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last server-side error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(engine: Arc<RoadmapEngine>) -> Self {
        Self {
            engine,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn note_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
    }

    /// Convert an engine error, remembering it when it is not the caller's fault
    pub async fn fail(&self, err: waypoint_common::Error) -> ApiError {
        let api_error = ApiError::from(err);
        if !matches!(api_error, ApiError::BadRequest(_) | ApiError::NotFound(_)) {
            self.note_error(api_error.to_string()).await;
        }
        api_error
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::roadmap_routes())
        .merge(api::quiz_routes())
        .merge(api::category_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
