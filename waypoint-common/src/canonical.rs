//! Canonicalization of free-form input
//!
//! Produces the two stable identities the engine keys everything on:
//! - **Slug**: URL-safe identifier derived from a display name
//! - **Fingerprint**: SHA-256 digest of a canonicalized quiz answer set
//!
//! Both are pure functions of their input. Neither touches the store.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Error, Result};

const SLUG_SEPARATOR: char = '-';

// ============================================================================
// Slugs
// ============================================================================

/// Derive a slug from free text
///
/// **Algorithm:**
/// 1. Lowercase every character
/// 2. Fold Latin diacritics to their base letters (é → e, ß → ss)
/// 3. Drop combining marks left over from decomposed input, keeping the
///    ones Unicode counts as alphabetic (U+0345) as letters
/// 4. Collapse every run of non-alphanumeric characters into one `-`
/// 5. Never emit a leading or trailing `-`
///
/// Total: inputs without any alphanumeric character yield an empty string,
/// which callers must treat as an invalid identity.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if is_combining_mark(c) && !c.is_alphabetic() {
            continue;
        }

        let folded = fold_diacritic(c);
        if folded.is_none() && !c.is_alphanumeric() {
            pending_separator = true;
            continue;
        }

        if pending_separator && !slug.is_empty() {
            slug.push(SLUG_SEPARATOR);
        }
        pending_separator = false;

        match folded {
            Some(base) => slug.push_str(base),
            None => slug.push(c),
        }
    }

    slug
}

/// Validated, non-empty slug
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Slugify a display name, rejecting names with no alphanumeric content
    pub fn from_name(name: &str) -> Result<Self> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(Error::InvalidIdentity(format!(
                "'{}' contains no alphanumeric characters",
                name.trim()
            )));
        }
        Ok(Self(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{1AB0}'..='\u{1AFF}' | '\u{20D0}'..='\u{20FF}')
}

/// Map a lowercase Latin letter with a diacritic to its ASCII base
fn fold_diacritic(c: char) -> Option<&'static str> {
    let base = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => "e",
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => "g",
        'ĥ' | 'ħ' => "h",
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => "i",
        'ĵ' => "j",
        'ķ' => "k",
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => "l",
        'ñ' | 'ń' | 'ņ' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => "o",
        'œ' => "oe",
        'ŕ' | 'ŗ' | 'ř' => "r",
        'ś' | 'ŝ' | 'ş' | 'š' | 'ș' => "s",
        'ß' => "ss",
        'ţ' | 'ť' | 'ŧ' | 'ț' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => "u",
        'ŵ' => "w",
        'ý' | 'ÿ' | 'ŷ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(base)
}

// ============================================================================
// Fingerprints
// ============================================================================

/// Quiz answers as submitted by a client
///
/// Clients send either a plain list of answers or an object keyed by
/// question id. Each shape has its own canonical form; both are hashed by
/// [`fingerprint`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuizAnswers {
    Sequence(Vec<serde_json::Value>),
    Keyed(BTreeMap<String, serde_json::Value>),
}

impl QuizAnswers {
    pub fn len(&self) -> usize {
        match self {
            QuizAnswers::Sequence(values) => values.len(),
            QuizAnswers::Keyed(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Answers in the shape the generation backend expects: one line per
    /// answer, original casing and spacing preserved.
    pub fn to_answer_lines(&self) -> Vec<String> {
        match self {
            QuizAnswers::Sequence(values) => values.iter().map(display_value).collect(),
            QuizAnswers::Keyed(entries) => entries
                .iter()
                .map(|(question, answer)| format!("{}: {}", question, display_value(answer)))
                .collect(),
        }
    }
}

/// SHA-256 digest (lowercase hex) of canonicalized input
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a digest read back from storage
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint a quiz answer set
///
/// - `Sequence`: every answer is normalized, then the list is sorted, so the
///   digest depends on the multiset of answers and not on their order.
/// - `Keyed`: entries are rendered `key:value` with both sides normalized and
///   sorted by key.
///
/// Each canonical token is length-prefixed so no two distinct token lists
/// share an encoding, and the shape tag keeps a list from colliding with a
/// mapping.
pub fn fingerprint(answers: &QuizAnswers) -> Fingerprint {
    let (tag, mut tokens) = match answers {
        QuizAnswers::Sequence(values) => {
            ("seq", values.iter().map(normalize_value).collect::<Vec<_>>())
        }
        QuizAnswers::Keyed(entries) => (
            "map",
            entries
                .iter()
                .map(|(key, value)| format!("{}:{}", normalize_text(key), normalize_value(value)))
                .collect(),
        ),
    };
    tokens.sort();

    let mut hasher = Sha256::new();
    hasher.update(tag.as_bytes());
    for token in &tokens {
        hasher.update(format!("|{}:", token.len()).as_bytes());
        hasher.update(token.as_bytes());
    }

    Fingerprint(format!("{:x}", hasher.finalize()))
}

/// Lowercase, trim and collapse internal whitespace
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn normalize_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => normalize_text(text),
        // serde_json maps keep keys sorted, so nested objects serialize stably
        other => other.to_string(),
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sequence(values: &[&str]) -> QuizAnswers {
        QuizAnswers::Sequence(values.iter().map(|v| json!(v)).collect())
    }

    #[test]
    fn test_slugify_examples() {
        assert_eq!(slugify("UX / UI Designer"), "ux-ui-designer");
        assert_eq!(slugify("  Multiple   Spaces!! "), "multiple-spaces");
        assert_eq!(slugify("Data Scientist"), "data-scientist");
        assert_eq!(slugify("C++ Developer"), "c-developer");
    }

    #[test]
    fn test_slugify_folds_diacritics() {
        assert_eq!(slugify("Café Owner"), "cafe-owner");
        assert_eq!(slugify("Straße Planer"), "strasse-planer");
        // Decomposed e + combining acute
        assert_eq!(slugify("Cafe\u{0301} Owner"), "cafe-owner");
    }

    #[test]
    fn test_alphabetic_combining_mark_is_kept() {
        assert_eq!(slugify("\u{0345}"), "\u{0345}");
        assert!(Slug::from_name("\u{0345}").is_ok());
    }

    #[test]
    fn test_slugify_without_alphanumerics_is_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("  ?!/ -- "), "");
    }

    #[test]
    fn test_slugify_keeps_non_latin_letters() {
        assert_eq!(slugify("日本 語"), "日本-語");
    }

    #[test]
    fn test_slug_from_name_rejects_empty() {
        let err = Slug::from_name("***").unwrap_err();
        assert!(matches!(err, Error::InvalidIdentity(_)));
        assert_eq!(Slug::from_name("Nurse").unwrap().as_str(), "nurse");
    }

    #[test]
    fn test_fingerprint_ignores_order_case_and_whitespace() {
        let a = fingerprint(&sequence(&["Python", "design"]));
        let b = fingerprint(&sequence(&["DESIGN", "  python "]));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_fingerprint_distinguishes_multisets() {
        let once = fingerprint(&sequence(&["python"]));
        let twice = fingerprint(&sequence(&["python", "python"]));
        assert_ne!(once, twice);
    }

    #[test]
    fn test_fingerprint_keyed_ignores_key_order() {
        let a: QuizAnswers = serde_json::from_value(json!({"q1": "Yes", "q2": 3})).unwrap();
        let b: QuizAnswers = serde_json::from_value(json!({"q2": 3, "q1": " yes"})).unwrap();
        assert!(matches!(a, QuizAnswers::Keyed(_)));
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_keyed_values_matter() {
        let a: QuizAnswers = serde_json::from_value(json!({"q1": "yes"})).unwrap();
        let b: QuizAnswers = serde_json::from_value(json!({"q1": "no"})).unwrap();
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_shapes_do_not_collide() {
        let keyed: QuizAnswers = serde_json::from_value(json!({"q1": "yes"})).unwrap();
        let listed = sequence(&["q1:yes"]);
        assert_ne!(fingerprint(&keyed), fingerprint(&listed));
    }

    #[test]
    fn test_fingerprint_structural_elements() {
        let a = QuizAnswers::Sequence(vec![json!({"b": 1, "a": 2}), json!(true)]);
        let b = QuizAnswers::Sequence(vec![json!(true), json!({"a": 2, "b": 1})]);
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_answer_lines_preserve_original_text() {
        let answers: QuizAnswers =
            serde_json::from_value(json!({"Favourite subject": " Art ", "hours": 4})).unwrap();
        assert_eq!(
            answers.to_answer_lines(),
            vec!["Favourite subject:  Art ".to_string(), "hours: 4".to_string()]
        );
    }
}
