//! Curated career taxonomy
//!
//! The taxonomy is configuration: a fixed list of categories with curated
//! career references, an ordered keyword table used to classify generated
//! roadmaps, and the labels the category engine must never trust. It is
//! loaded once (built-in or from TOML) and passed explicitly to the engine.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::canonical::slugify;
use crate::{Error, Result};

/// `{name, slug}` reference to a career
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerRef {
    pub name: String,
    /// Derived from `name` when omitted in configuration
    #[serde(default)]
    pub slug: String,
}

impl CareerRef {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self { name, slug }
    }
}

/// One curated category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyCategory {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub careers: Vec<CareerRef>,
}

/// Keyword list for one category; rules are evaluated in file order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: String,
    pub keywords: Vec<String>,
}

/// Catch-all bucket and the labels that never count as a classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    /// Historical auto-generated category tags
    #[serde(default)]
    pub legacy_labels: Vec<String>,
}

/// Static category taxonomy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTaxonomy {
    pub categories: Vec<TaxonomyCategory>,
    #[serde(default)]
    pub keywords: Vec<KeywordRule>,
    pub fallback: FallbackConfig,
}

/// Category as listed to clients: taxonomy entries merged with generated
/// roadmaps. Recomputed on every request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCategory {
    pub name: String,
    pub icon: String,
    pub careers: Vec<CareerRef>,
    /// Number of entries skipped because the list already held the same
    /// slug or display name
    pub deduplicated: usize,
}

impl CategoryTaxonomy {
    /// Load a taxonomy from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read taxonomy {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a taxonomy from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut taxonomy: CategoryTaxonomy = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse taxonomy: {}", e)))?;
        taxonomy.fill_missing_slugs();
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    pub fn contains_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    /// Case-insensitive check against the legacy label list
    pub fn is_legacy_label(&self, label: &str) -> bool {
        let label = label.trim();
        self.fallback
            .legacy_labels
            .iter()
            .any(|legacy| legacy.eq_ignore_ascii_case(label))
    }

    fn fill_missing_slugs(&mut self) {
        for career in self.categories.iter_mut().flat_map(|c| c.careers.iter_mut()) {
            if career.slug.trim().is_empty() {
                career.slug = slugify(&career.name);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.fallback.name.trim().is_empty() {
            return Err(Error::Config("Fallback category name must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(category.name.as_str()) {
                return Err(Error::Config(format!(
                    "Duplicate taxonomy category: {}",
                    category.name
                )));
            }
            for career in &category.careers {
                if career.slug.is_empty() {
                    return Err(Error::Config(format!(
                        "Career '{}' in '{}' has no usable slug",
                        career.name, category.name
                    )));
                }
            }
        }

        for rule in &self.keywords {
            if !self.contains_category(&rule.category) {
                return Err(Error::Config(format!(
                    "Keyword rule targets unknown category: {}",
                    rule.category
                )));
            }
        }

        Ok(())
    }

    /// Taxonomy compiled into the binary
    pub fn builtin() -> Self {
        fn category(name: &str, icon: &str, careers: &[&str]) -> TaxonomyCategory {
            TaxonomyCategory {
                name: name.to_string(),
                icon: icon.to_string(),
                careers: careers.iter().map(|c| CareerRef::new(*c)).collect(),
            }
        }

        fn rule(category: &str, keywords: &[&str]) -> KeywordRule {
            KeywordRule {
                category: category.to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            }
        }

        Self {
            categories: vec![
                category(
                    "Technology",
                    "💻",
                    &[
                        "Software Engineer",
                        "Data Scientist",
                        "Cybersecurity Analyst",
                        "Cloud Architect",
                        "DevOps Engineer",
                    ],
                ),
                category(
                    "Design & Creative",
                    "🎨",
                    &["UX / UI Designer", "Graphic Designer", "Animator", "Interior Designer"],
                ),
                category(
                    "Business & Finance",
                    "💼",
                    &[
                        "Accountant",
                        "Financial Analyst",
                        "Marketing Manager",
                        "Product Manager",
                        "Entrepreneur",
                    ],
                ),
                category(
                    "Healthcare",
                    "🩺",
                    &["Nurse", "Physician", "Pharmacist", "Physical Therapist"],
                ),
                category(
                    "Education",
                    "📚",
                    &["Teacher", "School Counselor", "Instructional Designer"],
                ),
                category(
                    "Engineering",
                    "⚙️",
                    &["Mechanical Engineer", "Civil Engineer", "Electrical Engineer"],
                ),
                category(
                    "Science & Research",
                    "🔬",
                    &["Biologist", "Chemist", "Environmental Scientist"],
                ),
                category(
                    "Arts & Media",
                    "🎬",
                    &["Writer / Author", "Journalist", "Musician", "Video Editor"],
                ),
                category(
                    "Law & Public Service",
                    "⚖️",
                    &["Lawyer", "Police Officer", "Social Worker"],
                ),
                category(
                    "Skilled Trades",
                    "🔧",
                    &["Electrician", "Plumber", "Carpenter", "Chef"],
                ),
            ],
            keywords: vec![
                rule(
                    "Technology",
                    &[
                        "software", "developer", "programmer", "data", "cyber", "cloud",
                        "devops", "machine learning", "web", "network", "blockchain",
                    ],
                ),
                rule(
                    "Healthcare",
                    &[
                        "nurse", "doctor", "medical", "health", "therap", "pharma", "dental",
                        "surgeon", "clinic", "paramedic",
                    ],
                ),
                rule(
                    "Design & Creative",
                    &["design", "graphic", "illustrat", "animat", "fashion"],
                ),
                rule(
                    "Business & Finance",
                    &[
                        "business", "market", "financ", "account", "sales", "consult",
                        "manager", "entrepreneur", "bank",
                    ],
                ),
                rule(
                    "Education",
                    &["teach", "tutor", "educat", "professor", "lecturer", "counselor"],
                ),
                rule(
                    "Engineering",
                    &["engineer", "mechanical", "civil", "robotic", "aerospace"],
                ),
                rule(
                    "Science & Research",
                    &["scien", "research", "biolog", "chemist", "physicist", "laborator"],
                ),
                rule(
                    "Arts & Media",
                    &["writer", "author", "journal", "music", "artist", "film", "video", "photograph", "actor"],
                ),
                rule(
                    "Law & Public Service",
                    &["lawyer", "legal", "attorney", "police", "judge", "social work", "government"],
                ),
                rule(
                    "Skilled Trades",
                    &["electrician", "plumb", "carpent", "chef", "cook", "weld", "construction", "mechanic"],
                ),
            ],
            fallback: FallbackConfig {
                name: "Community Generated".to_string(),
                icon: "🌱".to_string(),
                legacy_labels: vec![
                    "AI Generated".to_string(),
                    "Generated".to_string(),
                    "Other".to_string(),
                    "Uncategorized".to_string(),
                    "General".to_string(),
                ],
            },
        }
    }
}

impl Default for CategoryTaxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let taxonomy = CategoryTaxonomy::builtin();
        taxonomy.validate().expect("built-in taxonomy should validate");
        assert!(taxonomy.contains_category("Technology"));
        assert!(!taxonomy.contains_category(&taxonomy.fallback.name));
    }

    #[test]
    fn test_builtin_slugs_are_derived() {
        let taxonomy = CategoryTaxonomy::builtin();
        let design = &taxonomy.categories[1];
        assert_eq!(design.careers[0].slug, "ux-ui-designer");
    }

    #[test]
    fn test_legacy_labels_case_insensitive() {
        let taxonomy = CategoryTaxonomy::builtin();
        assert!(taxonomy.is_legacy_label("ai generated"));
        assert!(taxonomy.is_legacy_label(" Other "));
        assert!(!taxonomy.is_legacy_label("Technology"));
    }

    #[test]
    fn test_from_toml_fills_slugs() {
        let taxonomy = CategoryTaxonomy::from_toml_str(
            r#"
            [fallback]
            name = "Misc"

            [[categories]]
            name = "Tech"
            careers = [{ name = "Site Reliability Engineer" }]

            [[keywords]]
            category = "Tech"
            keywords = ["sre"]
            "#,
        )
        .unwrap();
        assert_eq!(taxonomy.categories[0].careers[0].slug, "site-reliability-engineer");
        assert!(taxonomy.fallback.legacy_labels.is_empty());
    }

    #[test]
    fn test_from_toml_rejects_unknown_keyword_category() {
        let err = CategoryTaxonomy::from_toml_str(
            r#"
            [fallback]
            name = "Misc"

            [[categories]]
            name = "Tech"

            [[keywords]]
            category = "Health"
            keywords = ["nurse"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
