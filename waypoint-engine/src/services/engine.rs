//! Roadmap engine - the operations exposed to the rest of the system
//!
//! - `resolve_or_create_roadmap` / `resolve_or_create_skill`
//! - `resolve_quiz_result`
//! - `list_merged_categories`
//! - `record_view`
//!
//! Wires the canonicalizer, fingerprint cache, identity resolver and category
//! engine to a store and a generator.

use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use waypoint_common::models::{
    CareerSuggestion, EnrichedSuggestion, Entity, EntityKind, EntityPatch, QuizKind,
};
use waypoint_common::taxonomy::{CategoryTaxonomy, MergedCategory};
use waypoint_common::{Error, QuizAnswers, Result, Slug};

use crate::services::category_engine::CategoryEngine;
use crate::services::identity_resolver::{IdentityResolver, Resolved};
use crate::services::inflight::InflightLeases;
use crate::services::quiz_cache::QuizCache;
use crate::types::{ContentGenerator, EntityStore, QuizResultStore};

/// Quiz suggestions and whether they came from the cache
#[derive(Debug, Clone, Serialize)]
pub struct QuizResolution {
    pub suggestions: Vec<EnrichedSuggestion>,
    pub cached: bool,
}

/// Active entity counts
#[derive(Debug, Clone, Serialize)]
pub struct EntityStats {
    pub total: i64,
    pub by_kind: BTreeMap<EntityKind, i64>,
}

pub struct RoadmapEngine {
    entities: Arc<dyn EntityStore>,
    generator: Arc<dyn ContentGenerator>,
    quiz_cache: QuizCache,
    resolver: IdentityResolver,
    categories: CategoryEngine,
}

impl RoadmapEngine {
    pub fn new<S>(
        store: Arc<S>,
        generator: Arc<dyn ContentGenerator>,
        taxonomy: Arc<CategoryTaxonomy>,
        lease_wait: Duration,
    ) -> Self
    where
        S: EntityStore + QuizResultStore + 'static,
    {
        let entities: Arc<dyn EntityStore> = store.clone();
        let results: Arc<dyn QuizResultStore> = store;
        let leases = Arc::new(InflightLeases::new(lease_wait));

        Self {
            quiz_cache: QuizCache::new(results, Arc::clone(&generator), Arc::clone(&leases)),
            resolver: IdentityResolver::new(Arc::clone(&entities), leases),
            categories: CategoryEngine::new(taxonomy, Arc::clone(&entities)),
            entities,
            generator,
        }
    }

    /// Resolve a career name to its roadmap, generating it on first request
    pub async fn resolve_or_create_roadmap(&self, name: &str) -> Result<Resolved> {
        self.resolve_or_create(EntityKind::Career, name).await
    }

    /// Resolve a soft skill name to its roadmap, generating it on first request
    pub async fn resolve_or_create_skill(&self, name: &str) -> Result<Resolved> {
        self.resolve_or_create(EntityKind::SoftSkill, name).await
    }

    async fn resolve_or_create(&self, kind: EntityKind, name: &str) -> Result<Resolved> {
        let generator = Arc::clone(&self.generator);
        let known_categories = match kind {
            EntityKind::Career => self.categories.taxonomy().category_names(),
            EntityKind::SoftSkill => Vec::new(),
        };

        self.resolver
            .resolve_or_create(kind, name, move |name, _slug| async move {
                let generated = generator
                    .generate_roadmap(&name, kind, &known_categories)
                    .await?;
                Ok::<_, Error>(generated.into_draft())
            })
            .await
    }

    /// Look up an active entity without generating anything
    pub async fn get_roadmap(&self, kind: EntityKind, slug: &str) -> Result<Option<Entity>> {
        let entity = self.entities.get_by_slug(kind, slug).await?;
        Ok(entity.filter(|e| e.is_active))
    }

    /// Resolve quiz answers to career suggestions, from cache when possible
    pub async fn resolve_quiz_result(
        &self,
        answers: &QuizAnswers,
        quiz_type: &str,
    ) -> Result<QuizResolution> {
        if answers.is_empty() {
            return Err(Error::InvalidInput("Quiz answers must not be empty".to_string()));
        }
        let kind = QuizKind::parse(quiz_type)?;

        let resolution = self.quiz_cache.resolve(answers, &kind).await?;
        let suggestions = self.enrich(resolution.suggestions).await;

        Ok(QuizResolution {
            suggestions,
            cached: resolution.was_cached,
        })
    }

    /// Derive slug, roadmap path and availability per suggestion
    ///
    /// Runs after the cache decision on every call. A suggestion whose
    /// enrichment fails is returned without the derived fields.
    async fn enrich(&self, suggestions: Vec<CareerSuggestion>) -> Vec<EnrichedSuggestion> {
        join_all(suggestions.into_iter().map(|suggestion| async move {
            match self.enrich_one(&suggestion).await {
                Ok(enriched) => enriched,
                Err(e) => {
                    tracing::debug!(career = %suggestion.career, error = %e, "Suggestion left unenriched");
                    EnrichedSuggestion::unenriched(suggestion)
                }
            }
        }))
        .await
    }

    async fn enrich_one(&self, suggestion: &CareerSuggestion) -> Result<EnrichedSuggestion> {
        let slug = Slug::from_name(&suggestion.career)?;

        let roadmap_available = match self.entities.get_by_slug(EntityKind::Career, slug.as_str()).await {
            Ok(existing) => Some(existing.is_some_and(|e| e.is_active)),
            Err(e) => {
                tracing::warn!(slug = %slug, error = %e, "Roadmap availability lookup failed");
                None
            }
        };

        let mut enriched = suggestion.clone();
        if enriched.roadmap_path.is_none() {
            enriched.roadmap_path = Some(format!("/roadmap/{}", slug));
        }

        Ok(EnrichedSuggestion {
            suggestion: enriched,
            slug: Some(slug.into_string()),
            roadmap_available,
        })
    }

    /// Taxonomy merged with every active generated roadmap
    pub async fn list_merged_categories(&self) -> Result<Vec<MergedCategory>> {
        self.categories.resolve_categories().await
    }

    /// Increment the view counter of the entity named by id or slug
    ///
    /// Returns `false` when nothing matched. Callers on the request path
    /// treat this as best-effort and discard errors after logging them.
    pub async fn record_view(&self, slug_or_id: &str) -> Result<bool> {
        let key = slug_or_id.trim();

        let id = match Uuid::parse_str(key) {
            Ok(id) => Some(id),
            Err(_) => self.find_by_slug_any_kind(key).await?.map(|e| e.id),
        };

        match id {
            Some(id) => self.entities.increment_views(id).await,
            None => Ok(false),
        }
    }

    async fn find_by_slug_any_kind(&self, slug: &str) -> Result<Option<Entity>> {
        for kind in [EntityKind::Career, EntityKind::SoftSkill] {
            if let Some(entity) = self.entities.get_by_slug(kind, slug).await? {
                return Ok(Some(entity));
            }
        }
        Ok(None)
    }

    /// Soft delete: hidden from listings, kept in the store
    pub async fn deactivate(&self, id: Uuid) -> Result<bool> {
        let patch = EntityPatch {
            is_active: Some(false),
            ..Default::default()
        };
        Ok(self.entities.update(id, &patch).await?.is_some())
    }

    /// Hard delete
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        self.entities.delete(id).await
    }

    pub async fn stats(&self) -> Result<EntityStats> {
        Ok(EntityStats {
            total: self.entities.count().await?,
            by_kind: self.entities.count_by_kind().await?,
        })
    }
}
