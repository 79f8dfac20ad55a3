//! Category Resolution Engine
//!
//! Merges the curated taxonomy with every active generated career roadmap
//! into one deduplicated category listing. Each roadmap is classified by the
//! first rule that succeeds:
//!
//! 1. Its stored category, when that names a taxonomy category and is not a
//!    legacy placeholder label
//! 2. Taxonomy lookup by slug
//! 3. Taxonomy lookup by lower-cased name (both halves of `A / B` names count)
//! 4. Keyword inference, first matching rule in table order
//! 5. The fallback category, created on first use
//!
//! The merge is a pure function of the taxonomy and the entity list; it is
//! recomputed on every request and writes nothing.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use waypoint_common::models::{Entity, EntityKind};
use waypoint_common::taxonomy::{CareerRef, CategoryTaxonomy, MergedCategory};
use waypoint_common::Result;

use crate::types::EntityStore;

/// Page size used when reading all active roadmaps
const PAGE_SIZE: i64 = 500;

/// Rule that classified an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStage {
    StoredCategory,
    SlugLookup,
    NameLookup,
    KeywordInference,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: String,
    pub stage: ResolutionStage,
}

/// Lookup tables derived from a taxonomy
pub struct CategoryIndex<'a> {
    taxonomy: &'a CategoryTaxonomy,
    by_category_name: HashMap<String, &'a str>,
    by_slug: HashMap<&'a str, &'a str>,
    by_name: HashMap<String, &'a str>,
    keywords: Vec<(&'a str, Vec<String>)>,
}

impl<'a> CategoryIndex<'a> {
    pub fn new(taxonomy: &'a CategoryTaxonomy) -> Self {
        let mut by_category_name = HashMap::new();
        let mut by_slug = HashMap::new();
        let mut by_name = HashMap::new();

        for category in &taxonomy.categories {
            let category_name = category.name.as_str();
            by_category_name
                .entry(category_name.trim().to_lowercase())
                .or_insert(category_name);

            for career in &category.careers {
                by_slug.entry(career.slug.as_str()).or_insert(category_name);

                let lowered = career.name.trim().to_lowercase();
                if lowered.contains('/') {
                    for part in lowered.split('/').map(str::trim).filter(|p| !p.is_empty()) {
                        by_name.entry(part.to_string()).or_insert(category_name);
                    }
                }
                by_name.entry(lowered).or_insert(category_name);
            }
        }

        let keywords = taxonomy
            .keywords
            .iter()
            .map(|rule| {
                let words = rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (rule.category.as_str(), words)
            })
            .collect();

        Self {
            taxonomy,
            by_category_name,
            by_slug,
            by_name,
            keywords,
        }
    }

    /// Pick the category for one entity; always succeeds
    pub fn classify(&self, entity: &Entity) -> Classification {
        if let Some(stored) = entity.category.as_deref().map(str::trim) {
            if !stored.is_empty() && !self.taxonomy.is_legacy_label(stored) {
                if let Some(category) = self.by_category_name.get(&stored.to_lowercase()) {
                    return found(category, ResolutionStage::StoredCategory);
                }
            }
        }

        if let Some(category) = self.by_slug.get(entity.slug.as_str()) {
            return found(category, ResolutionStage::SlugLookup);
        }

        let name = entity.name.trim().to_lowercase();
        if let Some(category) = self.by_name.get(&name) {
            return found(category, ResolutionStage::NameLookup);
        }

        for (category, words) in &self.keywords {
            if words.iter().any(|word| name.contains(word.as_str())) {
                return found(category, ResolutionStage::KeywordInference);
            }
        }

        found(&self.taxonomy.fallback.name, ResolutionStage::Fallback)
    }
}

fn found(category: &str, stage: ResolutionStage) -> Classification {
    Classification {
        category: category.to_string(),
        stage,
    }
}

/// Merge taxonomy and entities into the category listing
///
/// Output order: taxonomy categories as configured, then categories created
/// during the pass (the fallback bucket).
pub fn merge_categories(taxonomy: &CategoryTaxonomy, entities: &[Entity]) -> Vec<MergedCategory> {
    let index = CategoryIndex::new(taxonomy);

    let mut merged: Vec<MergedCategory> = taxonomy
        .categories
        .iter()
        .map(|category| MergedCategory {
            name: category.name.clone(),
            icon: category.icon.clone(),
            careers: category.careers.clone(),
            deduplicated: 0,
        })
        .collect();
    let mut positions: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, category)| (category.name.clone(), i))
        .collect();

    for entity in entities.iter().filter(|e| e.is_active) {
        let classification = index.classify(entity);
        tracing::trace!(
            slug = %entity.slug,
            category = %classification.category,
            stage = ?classification.stage,
            "Classified roadmap"
        );

        let position = match positions.get(&classification.category) {
            Some(&position) => position,
            None => {
                let icon = if classification.category == taxonomy.fallback.name {
                    taxonomy.fallback.icon.clone()
                } else {
                    String::new()
                };
                merged.push(MergedCategory {
                    name: classification.category.clone(),
                    icon,
                    careers: Vec::new(),
                    deduplicated: 0,
                });
                positions.insert(classification.category, merged.len() - 1);
                merged.len() - 1
            }
        };

        let target = &mut merged[position];
        let duplicate = target.careers.iter().any(|career| {
            career.slug == entity.slug || career.name.trim().eq_ignore_ascii_case(entity.name.trim())
        });
        if duplicate {
            target.deduplicated += 1;
            continue;
        }

        target.careers.push(CareerRef {
            name: entity.name.clone(),
            slug: entity.slug.clone(),
        });
    }

    merged
}

/// Store-backed category listing
pub struct CategoryEngine {
    taxonomy: Arc<CategoryTaxonomy>,
    store: Arc<dyn EntityStore>,
}

impl CategoryEngine {
    pub fn new(taxonomy: Arc<CategoryTaxonomy>, store: Arc<dyn EntityStore>) -> Self {
        Self { taxonomy, store }
    }

    pub fn taxonomy(&self) -> &CategoryTaxonomy {
        &self.taxonomy
    }

    /// Read every active career roadmap and merge it into the taxonomy
    pub async fn resolve_categories(&self) -> Result<Vec<MergedCategory>> {
        let mut entities = Vec::new();
        let mut skip = 0;
        loop {
            let page = self
                .store
                .get_all_active(EntityKind::Career, PAGE_SIZE, skip)
                .await?;
            let fetched = page.len() as i64;
            entities.extend(page);
            if fetched < PAGE_SIZE {
                break;
            }
            skip += fetched;
        }

        let merged = merge_categories(&self.taxonomy, &entities);
        tracing::debug!(
            roadmaps = entities.len(),
            categories = merged.len(),
            "Resolved merged categories"
        );
        Ok(merged)
    }
}
