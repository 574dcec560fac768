//! # Duplicate Detection
//!
//! The duplicate key is the (brand_name, manufacturer) pair, trimmed and
//! lowercased. The store indexes the folded parts so lookups by key agree
//! with the comparison done here.
//!
//! ## Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  candidate ("Lipitor ", "PFIZER")                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DedupKey { brand: "lipitor", manufacturer: "pfizer" }                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  store lookup by key ──► found?  ── yes ──► SkipDuplicate (existing    │
//! │                              │               record wins, no merge)    │
//! │                              └──── no ──► Insert                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use crate::types::{DrugRecord, NewDrug};

/// Folds one key part: trim, then Unicode lowercase.
pub fn fold_key_part(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Natural duplicate key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    brand: String,
    manufacturer: String,
}

impl DedupKey {
    pub fn new(brand_name: &str, manufacturer: &str) -> Self {
        DedupKey {
            brand: fold_key_part(brand_name),
            manufacturer: fold_key_part(manufacturer),
        }
    }

    #[inline]
    pub fn brand(&self) -> &str {
        &self.brand
    }

    #[inline]
    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }
}

/// What to do with a normalized candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DedupAction {
    Insert,
    SkipDuplicate { existing_id: String },
}

/// Decides the action for `candidate` given the result of the key lookup.
///
/// Skip-only: a match never merges fields from the candidate into the
/// existing record.
pub fn decide(candidate: &NewDrug, existing: Option<&DrugRecord>) -> DedupAction {
    match existing {
        Some(record) if record.dedup_key() == candidate.dedup_key() => {
            DedupAction::SkipDuplicate {
                existing_id: record.id.clone(),
            }
        }
        _ => DedupAction::Insert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(brand: &str, manufacturer: &str) -> NewDrug {
        NewDrug {
            brand_name: brand.to_string(),
            manufacturer: manufacturer.to_string(),
            generic_name: None,
            strength: None,
            form: None,
            category: None,
        }
    }

    fn record(id: &str, brand: &str, manufacturer: &str) -> DrugRecord {
        let now = Utc::now();
        DrugRecord {
            id: id.to_string(),
            brand_name: brand.to_string(),
            manufacturer: manufacturer.to_string(),
            generic_name: None,
            strength: None,
            form: None,
            category: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_key_is_case_and_whitespace_insensitive() {
        assert_eq!(
            DedupKey::new(" Lipitor", "PFIZER "),
            DedupKey::new("lipitor", "Pfizer")
        );
        assert_ne!(
            DedupKey::new("Lipitor", "Pfizer"),
            DedupKey::new("Lipitor", "Viatris")
        );
    }

    #[test]
    fn test_key_folds_unicode() {
        let key = DedupKey::new("ÉLIXIR", "Ärzte AG");
        assert_eq!(key.brand(), "élixir");
        assert_eq!(key.manufacturer(), "ärzte ag");
    }

    #[test]
    fn test_decide_without_match_inserts() {
        let c = candidate("Lipitor", "Pfizer");
        assert_eq!(decide(&c, None), DedupAction::Insert);
    }

    #[test]
    fn test_decide_with_match_skips() {
        let c = candidate("lipitor", "pfizer");
        let existing = record("abc", "Lipitor", "Pfizer");
        assert_eq!(
            decide(&c, Some(&existing)),
            DedupAction::SkipDuplicate {
                existing_id: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_decide_ignores_foreign_match() {
        let c = candidate("Lipitor", "Pfizer");
        let other = record("xyz", "Lipitor", "Viatris");
        assert_eq!(decide(&c, Some(&other)), DedupAction::Insert);
    }
}
