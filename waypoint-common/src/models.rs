//! Domain models shared by the store, the generator client and the engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::canonical::{slugify, Fingerprint, Slug};
use crate::{Error, Result};

// ============================================================================
// Entities
// ============================================================================

/// Kind of roadmap entity; partitions slug uniqueness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Career,
    SoftSkill,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Career => "career",
            EntityKind::SoftSkill => "soft_skill",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "career" => Ok(EntityKind::Career),
            "soft_skill" => Ok(EntityKind::SoftSkill),
            other => Err(Error::InvalidInput(format!("Unknown entity kind: {}", other))),
        }
    }
}

/// Content schema version written by the current generator integration
pub const CURRENT_CONTENT_SCHEMA: u32 = 2;

/// Sections current content must carry
///
/// Stored content is always judged against this list, whatever version
/// wrote it. Version 1 roadmaps only carried steps.
pub const REQUIRED_SECTIONS: &[&str] = &["steps", "insights", "alternative_careers"];

/// One step of a generated roadmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapStep {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
}

/// Market and skills insight attached to a roadmap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadmapInsights {
    #[serde(default, alias = "salaryRange", skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(default, alias = "marketOutlook", skip_serializing_if = "Option::is_none")]
    pub market_outlook: Option<String>,
    #[serde(default, alias = "keySkills")]
    pub key_skills: Vec<String>,
}

/// Generated roadmap body, stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapContent {
    /// Rows written before versioning was introduced deserialize as version 1
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub steps: Vec<RoadmapStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<RoadmapInsights>,
    #[serde(default, alias = "alternativeCareers", skip_serializing_if = "Option::is_none")]
    pub alternative_careers: Option<Vec<String>>,
}

fn legacy_schema_version() -> u32 {
    1
}

impl RoadmapContent {
    /// Content in the current schema
    pub fn new(
        steps: Vec<RoadmapStep>,
        insights: RoadmapInsights,
        alternative_careers: Vec<String>,
    ) -> Self {
        Self {
            schema_version: CURRENT_CONTENT_SCHEMA,
            steps,
            insights: Some(insights),
            alternative_careers: Some(alternative_careers),
        }
    }

    /// Sections the current schema requires that this content lacks
    pub fn missing_sections(&self) -> Vec<&'static str> {
        REQUIRED_SECTIONS
            .iter()
            .copied()
            .filter(|section| match *section {
                "steps" => self.steps.is_empty(),
                "insights" => self.insights.is_none(),
                "alternative_careers" => self.alternative_careers.is_none(),
                _ => false,
            })
            .collect()
    }

    /// Written by an older schema or missing a required section
    pub fn is_stale(&self) -> bool {
        self.schema_version < CURRENT_CONTENT_SCHEMA || !self.missing_sections().is_empty()
    }
}

/// Persisted career roadmap or soft-skill roadmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub kind: EntityKind,
    pub name: String,
    pub slug: String,
    pub category: Option<String>,
    pub content: RoadmapContent,
    pub view_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    pub fn new(
        kind: EntityKind,
        name: impl Into<String>,
        slug: Slug,
        category: Option<String>,
        content: RoadmapContent,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into().trim().to_string(),
            slug: slug.into_string(),
            category,
            content,
            view_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied by `update(id, partial)`
#[derive(Debug, Clone, Default)]
pub struct EntityPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub content: Option<RoadmapContent>,
    pub is_active: Option<bool>,
}

impl EntityPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.content.is_none()
            && self.is_active.is_none()
    }
}

// ============================================================================
// Quiz results
// ============================================================================

/// Quiz variant; partitions the fingerprint cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizKind(String);

impl QuizKind {
    /// Normalize a client-supplied quiz type (`"Career Explorer"` →
    /// `career-explorer`)
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = slugify(raw);
        if normalized.is_empty() {
            return Err(Error::InvalidInput(format!("Invalid quiz type: '{}'", raw)));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuizKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Career suggestion produced by the generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerSuggestion {
    pub career: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, alias = "roadmapPath", skip_serializing_if = "Option::is_none")]
    pub roadmap_path: Option<String>,
}

/// Suggestion with fields derived after the cache decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSuggestion {
    #[serde(flatten)]
    pub suggestion: CareerSuggestion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Whether a roadmap already exists for the slug; absent when unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roadmap_available: Option<bool>,
}

impl EnrichedSuggestion {
    /// Suggestion passed through without derived fields
    pub fn unenriched(suggestion: CareerSuggestion) -> Self {
        Self {
            suggestion,
            slug: None,
            roadmap_available: None,
        }
    }
}

/// Stored quiz result; immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResult {
    pub id: Uuid,
    pub fingerprint: Fingerprint,
    pub result_kind: QuizKind,
    pub payload: Vec<CareerSuggestion>,
    pub created_at: DateTime<Utc>,
}

impl CachedResult {
    pub fn new(fingerprint: Fingerprint, result_kind: QuizKind, payload: Vec<CareerSuggestion>) -> Self {
        Self {
            id: Uuid::new_v4(),
            fingerprint,
            result_kind,
            payload,
            created_at: Utc::now(),
        }
    }
}
