// aidis-core/src/naming.rs
// ============================================================================
// Module: Naming Rules
// Description: Convention rules, conflict shapes, and similarity scoring.
// Purpose: Pure naming-registry logic shared by check, register, and suggest.
// Dependencies: serde, similar
// ============================================================================

//! ## Overview
//! The naming registry rejects exact canonical matches and alias collisions
//! as errors, and reports similar names and convention violations as
//! warnings. Everything here is pure: convention patterns are a fixed
//! mapping from entity type, and similarity is a normalized ratio over
//! lowercased names.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use similar::TextDiff;

use crate::entities::NamingEntityType;
use crate::entities::NamingEntry;

/// Similarity ratio at or above which a name is reported as similar.
pub const SIMILAR_NAME_THRESHOLD: f64 = 0.6;

/// Stopwords skipped during keyword extraction.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "in", "is", "it", "its",
    "of", "on", "or", "that", "the", "this", "to", "was", "which", "will", "with",
];

// ============================================================================
// SECTION: Conventions
// ============================================================================

/// Naming conventions enforced per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    /// `lowerCamelCase` identifiers.
    CamelCase,
    /// `UpperCamelCase` identifiers.
    PascalCase,
    /// `SCREAMING_SNAKE_CASE` identifiers.
    ScreamingSnakeCase,
}

impl NamingConvention {
    /// Returns the convention for an entity type, when one is defined.
    #[must_use]
    pub const fn for_entity_type(entity_type: NamingEntityType) -> Option<Self> {
        match entity_type {
            NamingEntityType::Variable | NamingEntityType::Function => Some(Self::CamelCase),
            NamingEntityType::Class | NamingEntityType::Interface | NamingEntityType::Component => {
                Some(Self::PascalCase)
            }
            NamingEntityType::ConfigKey | NamingEntityType::EnvironmentVar => {
                Some(Self::ScreamingSnakeCase)
            }
            _ => None,
        }
    }

    /// Returns the human-readable convention label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CamelCase => "camelCase",
            Self::PascalCase => "PascalCase",
            Self::ScreamingSnakeCase => "SCREAMING_SNAKE_CASE",
        }
    }

    /// Returns true when `name` follows the convention.
    #[must_use]
    pub fn matches(self, name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        match self {
            Self::CamelCase => {
                first.is_ascii_lowercase() && chars.all(|c| c.is_ascii_alphanumeric())
            }
            Self::PascalCase => {
                first.is_ascii_uppercase() && chars.all(|c| c.is_ascii_alphanumeric())
            }
            Self::ScreamingSnakeCase => {
                first.is_ascii_uppercase()
                    && name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
            }
        }
    }

    /// Renders `words` in this convention.
    #[must_use]
    pub fn apply(self, words: &[String]) -> String {
        match self {
            Self::CamelCase => {
                let mut out = String::new();
                for (index, word) in words.iter().enumerate() {
                    if index == 0 {
                        out.push_str(&word.to_lowercase());
                    } else {
                        out.push_str(&capitalize(word));
                    }
                }
                out
            }
            Self::PascalCase => words.iter().map(|word| capitalize(word)).collect(),
            Self::ScreamingSnakeCase => words
                .iter()
                .map(|word| word.to_uppercase())
                .collect::<Vec<_>>()
                .join("_"),
        }
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Uppercases the first character of `word` and lowercases the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ============================================================================
// SECTION: Conflicts
// ============================================================================

/// Conflict classification reported by naming checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConflictType {
    /// Canonical name already registered.
    ExactMatch,
    /// Name collides with a registered alias.
    AliasConflict,
    /// Name is suspiciously close to a registered name.
    SimilarName,
    /// Name breaks the entity type's convention.
    ConventionViolation,
}

/// Severity of a reported conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConflictSeverity {
    /// Informational only.
    Info,
    /// Registration proceeds with a warning attached.
    Warning,
    /// Registration is rejected.
    Error,
}

/// One conflict reported by `naming_check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingConflict {
    /// Conflict classification.
    #[serde(rename = "type")]
    pub conflict_type: NamingConflictType,
    /// Conflict severity.
    pub severity: NamingConflictSeverity,
    /// Registered entry the conflict refers to, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_entry: Option<NamingEntry>,
    /// Human-readable conflict description.
    pub conflict_reason: String,
    /// Suggested alternative, when one is obvious.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

// ============================================================================
// SECTION: Similarity and Keywords
// ============================================================================

/// Normalized similarity between two names in `[0, 1]`.
///
/// Names are lowercased first so case conventions do not mask near-misses.
#[must_use]
pub fn name_similarity(left: &str, right: &str) -> f64 {
    let left = left.to_lowercase();
    let right = right.to_lowercase();
    if left == right {
        return 1.0;
    }
    f64::from(TextDiff::from_chars(left.as_str(), right.as_str()).ratio())
}

/// Splits an identifier into lowercase words on separators and case
/// boundaries.
#[must_use]
pub fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if c.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
        previous_lower = c.is_lowercase() || c.is_numeric();
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Extracts up to `max` non-stopword keywords from a free-text description.
#[must_use]
pub fn extract_keywords(description: &str, max: usize) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for token in description.split(|c: char| !c.is_alphanumeric()) {
        if keywords.len() == max {
            break;
        }
        let token = token.to_lowercase();
        if token.len() < 2 || STOPWORDS.contains(&token.as_str()) {
            continue;
        }
        if !keywords.contains(&token) {
            keywords.push(token);
        }
    }
    keywords
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        reason = "Test-only assertions."
    )]

    use super::NamingConvention;
    use super::SIMILAR_NAME_THRESHOLD;
    use super::extract_keywords;
    use super::name_similarity;
    use crate::entities::NamingEntityType;

    #[test]
    fn conventions_map_entity_types_per_the_fixed_table() {
        assert_eq!(
            NamingConvention::for_entity_type(NamingEntityType::Variable),
            Some(NamingConvention::CamelCase)
        );
        assert_eq!(
            NamingConvention::for_entity_type(NamingEntityType::Function),
            Some(NamingConvention::CamelCase)
        );
        assert_eq!(
            NamingConvention::for_entity_type(NamingEntityType::Class),
            Some(NamingConvention::PascalCase)
        );
        assert_eq!(
            NamingConvention::for_entity_type(NamingEntityType::EnvironmentVar),
            Some(NamingConvention::ScreamingSnakeCase)
        );
        assert_eq!(NamingConvention::for_entity_type(NamingEntityType::File), None);
    }

    #[test]
    fn convention_matching_accepts_well_formed_names() {
        assert!(NamingConvention::CamelCase.matches("userService"));
        assert!(NamingConvention::PascalCase.matches("UserService"));
        assert!(NamingConvention::ScreamingSnakeCase.matches("MAX_RETRY_COUNT"));
    }

    #[test]
    fn convention_matching_rejects_violations() {
        assert!(!NamingConvention::CamelCase.matches("UserService"));
        assert!(!NamingConvention::CamelCase.matches("user_service"));
        assert!(!NamingConvention::PascalCase.matches("userService"));
        assert!(!NamingConvention::ScreamingSnakeCase.matches("maxRetryCount"));
        assert!(!NamingConvention::PascalCase.matches(""));
    }

    #[test]
    fn apply_renders_words_in_each_convention() {
        let words = vec!["user".to_string(), "session".to_string(), "cache".to_string()];
        assert_eq!(NamingConvention::CamelCase.apply(&words), "userSessionCache");
        assert_eq!(NamingConvention::PascalCase.apply(&words), "UserSessionCache");
        assert_eq!(NamingConvention::ScreamingSnakeCase.apply(&words), "USER_SESSION_CACHE");
    }

    #[test]
    fn similarity_is_one_for_case_variants() {
        assert!((name_similarity("UserService", "userservice") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn near_misses_score_above_the_threshold() {
        assert!(name_similarity("UserService", "UserServices") >= SIMILAR_NAME_THRESHOLD);
        assert!(name_similarity("fetchUserData", "fetchUsrData") >= SIMILAR_NAME_THRESHOLD);
    }

    #[test]
    fn unrelated_names_score_below_the_threshold() {
        assert!(name_similarity("UserService", "zq") < SIMILAR_NAME_THRESHOLD);
    }

    #[test]
    fn keyword_extraction_skips_stopwords_and_duplicates() {
        let keywords = extract_keywords("a cache for the user session and the user", 3);
        assert_eq!(keywords, vec!["cache", "user", "session"]);
    }

    #[test]
    fn keyword_extraction_caps_at_max() {
        let keywords = extract_keywords("alpha beta gamma delta", 2);
        assert_eq!(keywords.len(), 2);
    }

    #[test]
    fn split_words_handles_each_convention() {
        assert_eq!(super::split_words("userSessionCache"), vec!["user", "session", "cache"]);
        assert_eq!(super::split_words("UserService"), vec!["user", "service"]);
        assert_eq!(super::split_words("MAX_RETRY_COUNT"), vec!["max", "retry", "count"]);
        assert_eq!(super::split_words("kebab-case-name"), vec!["kebab", "case", "name"]);
    }
}
