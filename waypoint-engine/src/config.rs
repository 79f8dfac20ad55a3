//! Configuration resolution for waypoint-engine
//!
//! Generator API key: Database → ENV → TOML. Taxonomy: TOML path → built-in.

use sqlx::{Pool, Sqlite};
use tracing::{info, warn};
use waypoint_common::config::TomlConfig;
use waypoint_common::taxonomy::CategoryTaxonomy;
use waypoint_common::Result;

/// Environment variable carrying the generation service API key
pub const API_KEY_ENV_VAR: &str = "WAYPOINT_GENERATOR_API_KEY";

/// Resolve generation service API key from 3-tier configuration
///
/// **Priority:** Database → ENV → TOML
///
/// The key is optional: a backend on a private network may not need one.
pub async fn resolve_generator_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<Option<String>> {
    let db_key = crate::db::settings::get_generator_api_key(db)
        .await?
        .filter(|k| is_valid_key(k));
    let env_key = std::env::var(API_KEY_ENV_VAR).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .generator
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    let sources: Vec<&str> = [
        (db_key.is_some(), "database"),
        (env_key.is_some(), "environment"),
        (toml_key.is_some(), "TOML"),
    ]
    .into_iter()
    .filter_map(|(present, name)| present.then_some(name))
    .collect();

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "Generator API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = db_key {
        info!("Generator API key loaded from database");
        return Ok(Some(key));
    }

    if let Some(key) = env_key {
        info!("Generator API key loaded from environment variable");
        return Ok(Some(key));
    }

    if let Some(key) = toml_key {
        info!("Generator API key loaded from TOML config");
        return Ok(Some(key));
    }

    warn!(
        "Generator API key not configured; requests are sent unauthenticated. Configure via \
         {} or [generator] api_key in waypoint.toml",
        API_KEY_ENV_VAR
    );
    Ok(None)
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Load the curated taxonomy
///
/// A configured file that cannot be read or fails validation is an error:
/// silently substituting the built-in taxonomy would change category names.
pub fn load_taxonomy(toml_config: &TomlConfig) -> Result<CategoryTaxonomy> {
    match &toml_config.taxonomy.path {
        Some(path) => {
            let taxonomy = CategoryTaxonomy::load(path)?;
            info!(
                path = %path.display(),
                categories = taxonomy.categories.len(),
                "Loaded category taxonomy"
            );
            Ok(taxonomy)
        }
        None => {
            info!("Using built-in category taxonomy");
            Ok(CategoryTaxonomy::builtin())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_pool;
    use crate::db::settings::set_generator_api_key;
    use serial_test::serial;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[tokio::test]
    #[serial]
    async fn test_database_key_wins() {
        std::env::set_var(API_KEY_ENV_VAR, "env-key");
        let pool = init_memory_pool().await.unwrap();
        set_generator_api_key(&pool, "db-key").await.unwrap();

        let mut config = TomlConfig::default();
        config.generator.api_key = Some("toml-key".to_string());

        let key = resolve_generator_api_key(&pool, &config).await.unwrap();
        std::env::remove_var(API_KEY_ENV_VAR);
        assert_eq!(key.as_deref(), Some("db-key"));
    }

    #[tokio::test]
    #[serial]
    async fn test_env_key_before_toml() {
        std::env::set_var(API_KEY_ENV_VAR, "env-key");
        let pool = init_memory_pool().await.unwrap();

        let mut config = TomlConfig::default();
        config.generator.api_key = Some("toml-key".to_string());

        let key = resolve_generator_api_key(&pool, &config).await.unwrap();
        std::env::remove_var(API_KEY_ENV_VAR);
        assert_eq!(key.as_deref(), Some("env-key"));
    }

    #[tokio::test]
    #[serial]
    async fn test_blank_keys_ignored() {
        std::env::set_var(API_KEY_ENV_VAR, "  ");
        let pool = init_memory_pool().await.unwrap();

        let key = resolve_generator_api_key(&pool, &TomlConfig::default()).await.unwrap();
        std::env::remove_var(API_KEY_ENV_VAR);
        assert_eq!(key, None);
    }

    #[test]
    fn test_missing_taxonomy_file_is_error() {
        let mut config = TomlConfig::default();
        config.taxonomy.path = Some("/nonexistent/taxonomy.toml".into());
        assert!(load_taxonomy(&config).is_err());
    }

    #[test]
    fn test_default_taxonomy_is_builtin() {
        let taxonomy = load_taxonomy(&TomlConfig::default()).unwrap();
        assert_eq!(taxonomy, CategoryTaxonomy::builtin());
    }
}
