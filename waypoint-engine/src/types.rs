//! Core Types and Trait Definitions for waypoint-engine
//!
//! The engine talks to two external collaborators through narrow traits:
//! - **EntityStore / QuizResultStore**: the persistent store
//! - **ContentGenerator**: the slow, fallible text-generation backend
//!
//! Production wiring uses [`crate::db::SqliteStore`] and
//! [`crate::services::HttpGenerator`]; tests substitute their own
//! implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;
use waypoint_common::models::{
    CachedResult, CareerSuggestion, Entity, EntityKind, EntityPatch, QuizKind, RoadmapContent,
    RoadmapInsights, RoadmapStep,
};
use waypoint_common::{Fingerprint, Result};

// ============================================================================
// Persistent store
// ============================================================================

/// Result of an insert that must respect slug uniqueness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Another entity of the same kind already owns the slug
    SlugTaken,
}

/// Roadmap entity persistence
///
/// Lookups return `Ok(None)` for a missing record; `Err` always means the
/// store itself failed. Implementations never retry internally.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_by_slug(&self, kind: EntityKind, slug: &str) -> Result<Option<Entity>>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Entity>>;

    async fn create(&self, entity: &Entity) -> Result<CreateOutcome>;

    /// Apply a partial update; `None` when no entity has this id
    async fn update(&self, id: Uuid, patch: &EntityPatch) -> Result<Option<Entity>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Increment-only; `false` when the entity is missing or inactive
    async fn increment_views(&self, id: Uuid) -> Result<bool>;

    async fn get_all_active(&self, kind: EntityKind, limit: i64, skip: i64) -> Result<Vec<Entity>>;

    /// Number of active entities
    async fn count(&self) -> Result<i64>;

    /// Number of active entities per kind
    async fn count_by_kind(&self) -> Result<BTreeMap<EntityKind, i64>>;
}

/// Cached quiz result persistence
#[async_trait]
pub trait QuizResultStore: Send + Sync {
    async fn find_cached_result(
        &self,
        fingerprint: &Fingerprint,
        result_kind: &QuizKind,
    ) -> Result<Option<CachedResult>>;

    /// Pure insert; duplicates for the same key are tolerated
    async fn create_cached_result(&self, record: &CachedResult) -> Result<()>;
}

// ============================================================================
// Generation service
// ============================================================================

/// Generation service errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Generation returned no results")]
    EmptyResult,
}

impl From<GenerationError> for waypoint_common::Error {
    fn from(err: GenerationError) -> Self {
        waypoint_common::Error::Generation(err.to_string())
    }
}

/// Roadmap body as produced by the generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRoadmap {
    pub steps: Vec<RoadmapStep>,
    #[serde(default)]
    pub insights: RoadmapInsights,
    #[serde(default, alias = "alternativeCareers")]
    pub alternative_careers: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl GeneratedRoadmap {
    pub fn into_draft(self) -> EntityDraft {
        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        EntityDraft {
            content: RoadmapContent::new(self.steps, self.insights, self.alternative_careers),
            category,
        }
    }
}

/// Content and classification for an entity about to be created or refreshed
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDraft {
    pub content: RoadmapContent,
    pub category: Option<String>,
}

/// Text-generation backend
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate a roadmap for a career or soft skill
    async fn generate_roadmap(
        &self,
        name: &str,
        kind: EntityKind,
        known_categories: &[String],
    ) -> std::result::Result<GeneratedRoadmap, GenerationError>;

    /// Suggest careers for a set of quiz answers
    async fn generate_quiz_suggestions(
        &self,
        answers: &[String],
        variant: &QuizKind,
    ) -> std::result::Result<Vec<CareerSuggestion>, GenerationError>;
}
