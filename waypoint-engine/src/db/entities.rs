//! Entity database operations

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use uuid::Uuid;
use waypoint_common::models::{Entity, EntityKind, EntityPatch, RoadmapContent};
use waypoint_common::{Error, Result};

use super::parse_timestamp;
use crate::types::CreateOutcome;

const ENTITY_COLUMNS: &str = "guid, kind, name, slug, category, content, view_count, is_active, created_at, updated_at";

/// Insert a new entity; `SlugTaken` when (kind, slug) already exists
pub async fn insert_entity(pool: &SqlitePool, entity: &Entity) -> Result<CreateOutcome> {
    let content = serde_json::to_string(&entity.content)?;

    let result = sqlx::query(
        r#"
        INSERT INTO entities (
            guid, kind, name, slug, category, content,
            view_count, is_active, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entity.id.to_string())
    .bind(entity.kind.as_str())
    .bind(&entity.name)
    .bind(&entity.slug)
    .bind(&entity.category)
    .bind(content)
    .bind(entity.view_count)
    .bind(entity.is_active)
    .bind(entity.created_at.to_rfc3339())
    .bind(entity.updated_at.to_rfc3339())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(CreateOutcome::Created),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::debug!(slug = %entity.slug, kind = %entity.kind, "Slug already taken");
            Ok(CreateOutcome::SlugTaken)
        }
        Err(e) => Err(e.into()),
    }
}

/// Load entity by kind and slug, active or not
pub async fn load_by_slug(pool: &SqlitePool, kind: EntityKind, slug: &str) -> Result<Option<Entity>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM entities WHERE kind = ? AND slug = ?",
        ENTITY_COLUMNS
    ))
    .bind(kind.as_str())
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(entity_from_row).transpose()
}

pub async fn load_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Entity>> {
    let row = sqlx::query(&format!("SELECT {} FROM entities WHERE guid = ?", ENTITY_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(entity_from_row).transpose()
}

/// Apply a partial update inside a transaction
///
/// Returns the updated entity, or `None` when no entity has this id. Slug and
/// kind never change.
pub async fn update_entity(pool: &SqlitePool, id: Uuid, patch: &EntityPatch) -> Result<Option<Entity>> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(&format!("SELECT {} FROM entities WHERE guid = ?", ENTITY_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut entity = entity_from_row(&row)?;

    if patch.is_empty() {
        return Ok(Some(entity));
    }

    if let Some(name) = &patch.name {
        entity.name = name.clone();
    }
    if let Some(category) = &patch.category {
        entity.category = Some(category.clone());
    }
    if let Some(content) = &patch.content {
        entity.content = content.clone();
    }
    if let Some(is_active) = patch.is_active {
        entity.is_active = is_active;
    }
    entity.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE entities
        SET name = ?, category = ?, content = ?, is_active = ?, updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(&entity.name)
    .bind(&entity.category)
    .bind(serde_json::to_string(&entity.content)?)
    .bind(entity.is_active)
    .bind(entity.updated_at.to_rfc3339())
    .bind(id.to_string())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(entity))
}

pub async fn delete_entity(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM entities WHERE guid = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Atomic increment; inactive entities are not counted
pub async fn increment_views(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE entities SET view_count = view_count + 1 WHERE guid = ? AND is_active = 1",
    )
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// One page of active entities in creation order
pub async fn load_active(pool: &SqlitePool, kind: EntityKind, limit: i64, skip: i64) -> Result<Vec<Entity>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM entities WHERE kind = ? AND is_active = 1 ORDER BY created_at, guid LIMIT ? OFFSET ?",
        ENTITY_COLUMNS
    ))
    .bind(kind.as_str())
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    rows.iter().map(entity_from_row).collect()
}

pub async fn count_active(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entities WHERE is_active = 1")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_active_by_kind(pool: &SqlitePool) -> Result<BTreeMap<EntityKind, i64>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT kind, COUNT(*) FROM entities WHERE is_active = 1 GROUP BY kind",
    )
    .fetch_all(pool)
    .await?;

    let mut counts = BTreeMap::new();
    for (kind, count) in rows {
        counts.insert(kind.parse::<EntityKind>()?, count);
    }
    Ok(counts)
}

fn entity_from_row(row: &SqliteRow) -> Result<Entity> {
    let guid: String = row.get("guid");
    let kind: String = row.get("kind");
    let content: String = row.get("content");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let id = Uuid::parse_str(&guid)
        .map_err(|e| Error::Internal(format!("Invalid entity guid '{}': {}", guid, e)))?;

    Ok(Entity {
        id,
        kind: kind.parse()?,
        name: row.get("name"),
        slug: row.get("slug"),
        category: row.get("category"),
        content: parse_content(&guid, &content),
        view_count: row.get("view_count"),
        is_active: row.get("is_active"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Unreadable content is treated as pre-versioning so it gets regenerated
fn parse_content(guid: &str, raw: &str) -> RoadmapContent {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!(guid = %guid, error = %e, "Stored content unreadable, treating as stale");
        RoadmapContent {
            schema_version: 0,
            steps: Vec::new(),
            insights: None,
            alternative_careers: None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_pool;
    use waypoint_common::models::{RoadmapInsights, RoadmapStep};
    use waypoint_common::Slug;

    fn sample(kind: EntityKind, name: &str) -> Entity {
        let content = RoadmapContent::new(
            vec![RoadmapStep {
                title: "Start".to_string(),
                description: String::new(),
                duration: None,
                resources: vec![],
            }],
            RoadmapInsights::default(),
            vec![],
        );
        Entity::new(kind, name, Slug::from_name(name).unwrap(), None, content)
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let pool = init_memory_pool().await.unwrap();
        let entity = sample(EntityKind::Career, "Data Scientist");

        assert_eq!(insert_entity(&pool, &entity).await.unwrap(), CreateOutcome::Created);

        let loaded = load_by_slug(&pool, EntityKind::Career, "data-scientist")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.id, entity.id);
        assert_eq!(loaded.content, entity.content);
        assert!(loaded.is_active);

        let by_id = load_by_id(&pool, entity.id).await.unwrap().unwrap();
        assert_eq!(by_id.slug, "data-scientist");
    }

    #[tokio::test]
    async fn test_duplicate_slug_reports_taken() {
        let pool = init_memory_pool().await.unwrap();
        insert_entity(&pool, &sample(EntityKind::Career, "Data Scientist")).await.unwrap();

        let outcome = insert_entity(&pool, &sample(EntityKind::Career, "data  scientist"))
            .await
            .unwrap();
        assert_eq!(outcome, CreateOutcome::SlugTaken);
    }

    #[tokio::test]
    async fn test_same_slug_different_kind_allowed() {
        let pool = init_memory_pool().await.unwrap();
        insert_entity(&pool, &sample(EntityKind::Career, "Leadership")).await.unwrap();

        let outcome = insert_entity(&pool, &sample(EntityKind::SoftSkill, "Leadership"))
            .await
            .unwrap();
        assert_eq!(outcome, CreateOutcome::Created);
    }

    #[tokio::test]
    async fn test_update_partial_fields() {
        let pool = init_memory_pool().await.unwrap();
        let entity = sample(EntityKind::Career, "Nurse");
        insert_entity(&pool, &entity).await.unwrap();

        let patch = EntityPatch {
            category: Some("Healthcare".to_string()),
            ..Default::default()
        };
        let updated = update_entity(&pool, entity.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.category.as_deref(), Some("Healthcare"));
        assert_eq!(updated.name, "Nurse");

        let missing = update_entity(&pool, Uuid::new_v4(), &patch).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_increment_views_skips_inactive() {
        let pool = init_memory_pool().await.unwrap();
        let entity = sample(EntityKind::Career, "Nurse");
        insert_entity(&pool, &entity).await.unwrap();

        assert!(increment_views(&pool, entity.id).await.unwrap());
        assert!(increment_views(&pool, entity.id).await.unwrap());

        let deactivate = EntityPatch {
            is_active: Some(false),
            ..Default::default()
        };
        update_entity(&pool, entity.id, &deactivate).await.unwrap();
        assert!(!increment_views(&pool, entity.id).await.unwrap());

        let loaded = load_by_id(&pool, entity.id).await.unwrap().unwrap();
        assert_eq!(loaded.view_count, 2);
    }

    #[tokio::test]
    async fn test_active_paging_and_counts() {
        let pool = init_memory_pool().await.unwrap();
        for name in ["Nurse", "Pilot", "Chef"] {
            insert_entity(&pool, &sample(EntityKind::Career, name)).await.unwrap();
        }
        insert_entity(&pool, &sample(EntityKind::SoftSkill, "Empathy")).await.unwrap();

        let first = load_active(&pool, EntityKind::Career, 2, 0).await.unwrap();
        let second = load_active(&pool, EntityKind::Career, 2, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);

        assert_eq!(count_active(&pool).await.unwrap(), 4);
        let by_kind = count_active_by_kind(&pool).await.unwrap();
        assert_eq!(by_kind.get(&EntityKind::Career), Some(&3));
        assert_eq!(by_kind.get(&EntityKind::SoftSkill), Some(&1));
    }

    #[tokio::test]
    async fn test_corrupt_content_loads_as_stale() {
        let pool = init_memory_pool().await.unwrap();
        let entity = sample(EntityKind::Career, "Nurse");
        insert_entity(&pool, &entity).await.unwrap();

        sqlx::query("UPDATE entities SET content = 'not json' WHERE guid = ?")
            .bind(entity.id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let loaded = load_by_id(&pool, entity.id).await.unwrap().unwrap();
        assert!(loaded.content.is_stale());
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = init_memory_pool().await.unwrap();
        let entity = sample(EntityKind::Career, "Nurse");
        insert_entity(&pool, &entity).await.unwrap();

        assert!(delete_entity(&pool, entity.id).await.unwrap());
        assert!(!delete_entity(&pool, entity.id).await.unwrap());
        assert!(load_by_id(&pool, entity.id).await.unwrap().is_none());
    }
}
