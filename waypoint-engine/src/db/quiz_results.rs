//! Cached quiz result database operations

use sqlx::{Row, SqlitePool};
use uuid::Uuid;
use waypoint_common::models::{CachedResult, QuizKind};
use waypoint_common::{Error, Fingerprint, Result};

use super::parse_timestamp;

/// Insert a quiz result; rows are never updated
pub async fn insert_result(pool: &SqlitePool, record: &CachedResult) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO quiz_results (guid, fingerprint, result_kind, payload, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id.to_string())
    .bind(record.fingerprint.as_str())
    .bind(record.result_kind.as_str())
    .bind(serde_json::to_string(&record.payload)?)
    .bind(record.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Oldest stored result for the key
///
/// Duplicate rows left by concurrent misses are tolerated; the oldest one
/// wins so repeated lookups are stable. A row whose payload no longer
/// parses is reported as a miss.
pub async fn find_result(
    pool: &SqlitePool,
    fingerprint: &Fingerprint,
    result_kind: &QuizKind,
) -> Result<Option<CachedResult>> {
    let row = sqlx::query(
        r#"
        SELECT guid, fingerprint, result_kind, payload, created_at
        FROM quiz_results
        WHERE fingerprint = ? AND result_kind = ?
        ORDER BY created_at, rowid
        LIMIT 1
        "#,
    )
    .bind(fingerprint.as_str())
    .bind(result_kind.as_str())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let guid: String = row.get("guid");
    let payload: String = row.get("payload");
    let created_at: String = row.get("created_at");

    let payload = match serde_json::from_str(&payload) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(guid = %guid, error = %e, "Cached quiz payload unreadable, ignoring");
            return Ok(None);
        }
    };

    Ok(Some(CachedResult {
        id: Uuid::parse_str(&guid)
            .map_err(|e| Error::Internal(format!("Invalid quiz result guid '{}': {}", guid, e)))?,
        fingerprint: fingerprint.clone(),
        result_kind: result_kind.clone(),
        payload,
        created_at: parse_timestamp(&created_at)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_pool;
    use chrono::{Duration, Utc};
    use waypoint_common::models::CareerSuggestion;

    fn suggestion(career: &str) -> CareerSuggestion {
        CareerSuggestion {
            career: career.to_string(),
            description: String::new(),
            reasoning: String::new(),
            roadmap_path: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let pool = init_memory_pool().await.unwrap();
        let fp = Fingerprint::from_hex("abc123");
        let kind = QuizKind::parse("career").unwrap();

        let record = CachedResult::new(fp.clone(), kind.clone(), vec![suggestion("Nurse")]);
        insert_result(&pool, &record).await.unwrap();

        let found = find_result(&pool, &fp, &kind).await.unwrap().unwrap();
        assert_eq!(found.id, record.id);
        assert_eq!(found.payload, record.payload);
    }

    #[tokio::test]
    async fn test_kind_partitions_results() {
        let pool = init_memory_pool().await.unwrap();
        let fp = Fingerprint::from_hex("abc123");
        let career = QuizKind::parse("career").unwrap();
        let skills = QuizKind::parse("skills").unwrap();

        insert_result(&pool, &CachedResult::new(fp.clone(), career, vec![suggestion("Nurse")]))
            .await
            .unwrap();

        assert!(find_result(&pool, &fp, &skills).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oldest_duplicate_wins() {
        let pool = init_memory_pool().await.unwrap();
        let fp = Fingerprint::from_hex("abc123");
        let kind = QuizKind::parse("career").unwrap();

        let newer = CachedResult::new(fp.clone(), kind.clone(), vec![suggestion("Pilot")]);
        let mut older = CachedResult::new(fp.clone(), kind.clone(), vec![suggestion("Nurse")]);
        older.created_at = Utc::now() - Duration::minutes(5);

        insert_result(&pool, &newer).await.unwrap();
        insert_result(&pool, &older).await.unwrap();

        let found = find_result(&pool, &fp, &kind).await.unwrap().unwrap();
        assert_eq!(found.payload[0].career, "Nurse");
    }

    #[tokio::test]
    async fn test_unreadable_payload_is_miss() {
        let pool = init_memory_pool().await.unwrap();
        let fp = Fingerprint::from_hex("abc123");
        let kind = QuizKind::parse("career").unwrap();

        let record = CachedResult::new(fp.clone(), kind.clone(), vec![suggestion("Nurse")]);
        insert_result(&pool, &record).await.unwrap();
        sqlx::query("UPDATE quiz_results SET payload = '{broken'")
            .execute(&pool)
            .await
            .unwrap();

        assert!(find_result(&pool, &fp, &kind).await.unwrap().is_none());
    }
}
