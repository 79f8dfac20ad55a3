//! Settings table
//!
//! Holds the generation service API key, the highest-priority source for it.
//! Blank values read back as unset.

use sqlx::{Pool, Sqlite};
use waypoint_common::{Error, Result};

const GENERATOR_API_KEY: &str = "generator_api_key";

pub async fn get_generator_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    read_value(db, GENERATOR_API_KEY).await
}

pub async fn set_generator_api_key(db: &Pool<Sqlite>, key: &str) -> Result<()> {
    write_value(db, GENERATOR_API_KEY, key.trim()).await
}

async fn read_value(db: &Pool<Sqlite>, key: &str) -> Result<Option<String>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    Ok(value.filter(|v| !v.trim().is_empty()))
}

async fn write_value(db: &Pool<Sqlite>, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
