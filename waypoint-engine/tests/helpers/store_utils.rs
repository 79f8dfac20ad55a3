//! Store fixtures: in-memory SQLite and a store with injectable failures

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use waypoint_common::models::{
    CachedResult, Entity, EntityKind, EntityPatch, QuizKind, RoadmapContent, RoadmapStep,
};
use waypoint_common::taxonomy::CategoryTaxonomy;
use waypoint_common::{Error, Fingerprint, Result, Slug};
use waypoint_engine::db::{init_memory_pool, SqliteStore};
use waypoint_engine::services::RoadmapEngine;
use waypoint_engine::types::{ContentGenerator, CreateOutcome, EntityStore, QuizResultStore};

pub async fn memory_store() -> Arc<SqliteStore> {
    let pool = init_memory_pool().await.unwrap();
    Arc::new(SqliteStore::new(pool))
}

/// Engine over `store` with the built-in taxonomy and a short lease wait
pub fn test_engine<S>(store: Arc<S>, generator: Arc<dyn ContentGenerator>) -> RoadmapEngine
where
    S: EntityStore + QuizResultStore + 'static,
{
    RoadmapEngine::new(
        store,
        generator,
        Arc::new(CategoryTaxonomy::builtin()),
        Duration::from_secs(5),
    )
}

/// Insert an entity whose content predates the current schema
pub async fn insert_legacy_entity(store: &dyn EntityStore, kind: EntityKind, name: &str) -> Entity {
    let content = RoadmapContent {
        schema_version: 1,
        steps: vec![RoadmapStep {
            title: "Old step".to_string(),
            description: String::new(),
            duration: None,
            resources: vec![],
        }],
        insights: None,
        alternative_careers: None,
    };
    let entity = Entity::new(kind, name, Slug::from_name(name).unwrap(), None, content);
    assert_eq!(store.create(&entity).await.unwrap(), CreateOutcome::Created);
    entity
}

/// SQLite store whose reads or writes can be switched to fail, and whose
/// Nth lookup can be held back after it has read the store
pub struct FlakyStore {
    pub inner: SqliteStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    lookups: AtomicUsize,
    slow_lookup: AtomicUsize,
}

impl FlakyStore {
    pub async fn new() -> Arc<Self> {
        let pool = init_memory_pool().await.unwrap();
        Arc::new(Self {
            inner: SqliteStore::new(pool),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            lookups: AtomicUsize::new(0),
            slow_lookup: AtomicUsize::new(0),
        })
    }

    /// Delay the `nth` lookup (1-based) by 300ms after its read completes
    pub fn slow_lookup(&self, nth: usize) {
        self.slow_lookup.store(nth, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    async fn lookup<T>(&self, read: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        self.check_read()?;
        let nth = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
        let found = read.await;
        if nth == self.slow_lookup.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        found
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Persistence("read unavailable".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence("write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for FlakyStore {
    async fn get_by_slug(&self, kind: EntityKind, slug: &str) -> Result<Option<Entity>> {
        self.lookup(self.inner.get_by_slug(kind, slug)).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Entity>> {
        self.check_read()?;
        self.inner.get_by_id(id).await
    }

    async fn create(&self, entity: &Entity) -> Result<CreateOutcome> {
        self.check_write()?;
        self.inner.create(entity).await
    }

    async fn update(&self, id: Uuid, patch: &EntityPatch) -> Result<Option<Entity>> {
        self.check_write()?;
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.check_write()?;
        self.inner.delete(id).await
    }

    async fn increment_views(&self, id: Uuid) -> Result<bool> {
        self.check_write()?;
        self.inner.increment_views(id).await
    }

    async fn get_all_active(&self, kind: EntityKind, limit: i64, skip: i64) -> Result<Vec<Entity>> {
        self.check_read()?;
        self.inner.get_all_active(kind, limit, skip).await
    }

    async fn count(&self) -> Result<i64> {
        self.check_read()?;
        self.inner.count().await
    }

    async fn count_by_kind(&self) -> Result<BTreeMap<EntityKind, i64>> {
        self.check_read()?;
        self.inner.count_by_kind().await
    }
}

#[async_trait]
impl QuizResultStore for FlakyStore {
    async fn find_cached_result(
        &self,
        fingerprint: &Fingerprint,
        result_kind: &QuizKind,
    ) -> Result<Option<CachedResult>> {
        self.lookup(self.inner.find_cached_result(fingerprint, result_kind))
            .await
    }

    async fn create_cached_result(&self, record: &CachedResult) -> Result<()> {
        self.check_write()?;
        self.inner.create_cached_result(record).await
    }
}
