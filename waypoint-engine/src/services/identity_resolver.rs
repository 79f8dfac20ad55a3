//! Identity Resolver - one persisted entity per slug
//!
//! `resolve_or_create` maps a display name to its slug and returns the entity
//! that owns it, creating it through a caller-supplied factory on first
//! resolution. A second resolution of an equivalent name never creates a
//! duplicate and never mutates a current entity.
//!
//! Active entities whose content predates the current schema are regenerated
//! in place. Regeneration is best-effort: on failure the stale entity is
//! returned as-is. Deactivated entities are never regenerated.
//!
//! Every lease holder re-reads the store before generating, so a caller that
//! missed while another holder was finishing still finds its result.
//!
//! Persisting is best-effort too: content generated for a request is returned
//! to that request even when the store rejects it (at-least-once compute,
//! at-most-once durable).

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use waypoint_common::models::{Entity, EntityKind, EntityPatch};
use waypoint_common::{Result, Slug};

use crate::services::inflight::{InflightLeases, LeaseOutcome};
use crate::types::{CreateOutcome, EntityDraft, EntityStore};

/// How an entity was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// Already stored and current
    Existing,
    /// Generated and stored by this call
    Created,
    /// Stored content was stale and has been regenerated
    Refreshed,
    /// Stored content is stale and regeneration failed
    StaleFallback,
    /// Generated by this call but the store did not keep it
    Unsaved,
}

#[derive(Debug, Clone)]
pub struct Resolved {
    pub entity: Entity,
    pub outcome: ResolutionOutcome,
}

impl Resolved {
    fn new(entity: Entity, outcome: ResolutionOutcome) -> Self {
        Self { entity, outcome }
    }
}

pub struct IdentityResolver {
    store: Arc<dyn EntityStore>,
    leases: Arc<InflightLeases>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn EntityStore>, leases: Arc<InflightLeases>) -> Self {
        Self { store, leases }
    }

    /// Resolve `name` to its entity, building it with `factory` if needed
    ///
    /// `factory` receives the trimmed name and its slug. It runs at most once
    /// per call: for a missing entity, or to refresh a stale active one.
    /// Inactive entities are returned as stored.
    pub async fn resolve_or_create<F, Fut>(
        &self,
        kind: EntityKind,
        name: &str,
        factory: F,
    ) -> Result<Resolved>
    where
        F: FnOnce(String, Slug) -> Fut,
        Fut: Future<Output = Result<EntityDraft>>,
    {
        let slug = Slug::from_name(name)?;
        let name = name.trim().to_string();

        if let Some(existing) = self.store.get_by_slug(kind, slug.as_str()).await? {
            if is_settled(&existing) {
                tracing::debug!(slug = %slug, kind = %kind, "Resolved existing entity");
                return Ok(Resolved::new(existing, ResolutionOutcome::Existing));
            }
        }

        let key = lease_key(kind, &slug);
        let (_lease, waited) = match self.leases.acquire(&key).await {
            LeaseOutcome::Acquired { lease, waited } => (Some(lease), waited),
            LeaseOutcome::Expired => (None, true),
        };

        // Another holder may have created or refreshed it since the first read
        match self.store.get_by_slug(kind, slug.as_str()).await? {
            Some(current) if is_settled(&current) => {
                tracing::debug!(slug = %slug, waited, "Concurrent request resolved entity");
                return Ok(Resolved::new(current, ResolutionOutcome::Existing));
            }
            Some(stale) => return self.refresh(stale, slug, factory).await,
            None => {}
        }

        tracing::info!(slug = %slug, kind = %kind, name = %name, "Entity not found, generating");
        let draft = factory(name.clone(), slug.clone()).await?;
        let entity = Entity::new(kind, name, slug.clone(), draft.category, draft.content);

        match self.store.create(&entity).await {
            Ok(CreateOutcome::Created) => {
                tracing::info!(slug = %slug, id = %entity.id, "Created entity");
                Ok(Resolved::new(entity, ResolutionOutcome::Created))
            }
            Ok(CreateOutcome::SlugTaken) => {
                // Lost a race with a writer that bypassed the lease
                match self.store.get_by_slug(kind, slug.as_str()).await {
                    Ok(Some(existing)) => Ok(Resolved::new(existing, ResolutionOutcome::Existing)),
                    Ok(None) => Ok(Resolved::new(entity, ResolutionOutcome::Unsaved)),
                    Err(e) => {
                        tracing::warn!(slug = %slug, error = %e, "Re-read after slug conflict failed");
                        Ok(Resolved::new(entity, ResolutionOutcome::Unsaved))
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    slug = %slug,
                    error = %e,
                    "Failed to persist generated entity; returning unsaved content"
                );
                Ok(Resolved::new(entity, ResolutionOutcome::Unsaved))
            }
        }
    }

    /// Regenerate stale content in place; the caller holds the lease
    async fn refresh<F, Fut>(&self, existing: Entity, slug: Slug, factory: F) -> Result<Resolved>
    where
        F: FnOnce(String, Slug) -> Fut,
        Fut: Future<Output = Result<EntityDraft>>,
    {
        tracing::info!(
            slug = %slug,
            schema_version = existing.content.schema_version,
            missing = ?existing.content.missing_sections(),
            "Stored content is stale, regenerating"
        );

        let draft = match factory(existing.name.clone(), slug.clone()).await {
            Ok(draft) => draft,
            Err(e) => {
                tracing::warn!(slug = %slug, error = %e, "Regeneration failed; serving stale content");
                return Ok(Resolved::new(existing, ResolutionOutcome::StaleFallback));
            }
        };

        let patch = EntityPatch {
            content: Some(draft.content),
            category: existing.category.is_none().then_some(draft.category).flatten(),
            ..Default::default()
        };

        match self.store.update(existing.id, &patch).await {
            Ok(Some(updated)) => {
                tracing::info!(slug = %slug, id = %updated.id, "Refreshed stale entity");
                Ok(Resolved::new(updated, ResolutionOutcome::Refreshed))
            }
            Ok(None) => {
                tracing::warn!(slug = %slug, "Entity vanished during refresh");
                Ok(Resolved::new(apply(existing, patch), ResolutionOutcome::Unsaved))
            }
            Err(e) => {
                tracing::warn!(slug = %slug, error = %e, "Failed to persist refreshed content");
                Ok(Resolved::new(apply(existing, patch), ResolutionOutcome::Unsaved))
            }
        }
    }
}

/// Nothing to generate: current content, or deactivated and left alone
fn is_settled(entity: &Entity) -> bool {
    !entity.is_active || !entity.content.is_stale()
}

fn lease_key(kind: EntityKind, slug: &Slug) -> String {
    format!("entity:{}:{}", kind, slug)
}

fn apply(mut entity: Entity, patch: EntityPatch) -> Entity {
    if let Some(content) = patch.content {
        entity.content = content;
    }
    if let Some(category) = patch.category {
        entity.category = Some(category);
    }
    entity
}
