//! SQLite-backed implementation of the store traits

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use uuid::Uuid;
use waypoint_common::models::{CachedResult, Entity, EntityKind, EntityPatch, QuizKind};
use waypoint_common::{Fingerprint, Result};

use super::{entities, quiz_results};
use crate::types::{CreateOutcome, EntityStore, QuizResultStore};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn get_by_slug(&self, kind: EntityKind, slug: &str) -> Result<Option<Entity>> {
        entities::load_by_slug(&self.pool, kind, slug).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Entity>> {
        entities::load_by_id(&self.pool, id).await
    }

    async fn create(&self, entity: &Entity) -> Result<CreateOutcome> {
        entities::insert_entity(&self.pool, entity).await
    }

    async fn update(&self, id: Uuid, patch: &EntityPatch) -> Result<Option<Entity>> {
        entities::update_entity(&self.pool, id, patch).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        entities::delete_entity(&self.pool, id).await
    }

    async fn increment_views(&self, id: Uuid) -> Result<bool> {
        entities::increment_views(&self.pool, id).await
    }

    async fn get_all_active(&self, kind: EntityKind, limit: i64, skip: i64) -> Result<Vec<Entity>> {
        entities::load_active(&self.pool, kind, limit, skip).await
    }

    async fn count(&self) -> Result<i64> {
        entities::count_active(&self.pool).await
    }

    async fn count_by_kind(&self) -> Result<BTreeMap<EntityKind, i64>> {
        entities::count_active_by_kind(&self.pool).await
    }
}

#[async_trait]
impl QuizResultStore for SqliteStore {
    async fn find_cached_result(
        &self,
        fingerprint: &Fingerprint,
        result_kind: &QuizKind,
    ) -> Result<Option<CachedResult>> {
        quiz_results::find_result(&self.pool, fingerprint, result_kind).await
    }

    async fn create_cached_result(&self, record: &CachedResult) -> Result<()> {
        quiz_results::insert_result(&self.pool, record).await
    }
}
