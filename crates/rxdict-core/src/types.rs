//! # Domain Types
//!
//! Core domain types used throughout the drug dictionary.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     RawRow      │   │     NewDrug     │   │   DrugRecord    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  field → value  │──►│  brand_name     │──►│  id (UUID)      │       │
//! │  │  (untrusted)    │   │  manufacturer   │   │  + NewDrug data │       │
//! │  │                 │   │  optional data  │   │  created_at     │       │
//! │  └─────────────────┘   └─────────────────┘   │  updated_at     │       │
//! │        normalize()         store insert      └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   DrugPatch     │   │   DrugField     │   │   DrugStats     │       │
//! │  │  partial update │   │  canonical col  │   │  aggregates     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every record has:
//! - `id`: UUID v4 - immutable, assigned by the store
//! - Duplicate key: (brand_name, manufacturer), case-insensitive and trimmed,
//!   used only by import deduplication (see [`crate::dedup`])

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dedup::DedupKey;

// =============================================================================
// Drug Field
// =============================================================================

/// Canonical field names a raw row may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrugField {
    BrandName,
    Manufacturer,
    GenericName,
    Strength,
    Form,
    Category,
}

impl DrugField {
    /// Every field, in export/column order.
    pub const ALL: [DrugField; 6] = [
        DrugField::BrandName,
        DrugField::Manufacturer,
        DrugField::GenericName,
        DrugField::Strength,
        DrugField::Form,
        DrugField::Category,
    ];

    /// Fields a row must carry to be accepted.
    pub const REQUIRED: [DrugField; 2] = [DrugField::BrandName, DrugField::Manufacturer];

    /// Returns the canonical snake_case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            DrugField::BrandName => "brand_name",
            DrugField::Manufacturer => "manufacturer",
            DrugField::GenericName => "generic_name",
            DrugField::Strength => "strength",
            DrugField::Form => "form",
            DrugField::Category => "category",
        }
    }

    /// Looks up a field by its canonical name (already normalized).
    pub fn from_canonical(name: &str) -> Option<Self> {
        DrugField::ALL.into_iter().find(|f| f.as_str() == name)
    }

    #[inline]
    pub const fn is_required(self) -> bool {
        matches!(self, DrugField::BrandName | DrugField::Manufacturer)
    }
}

impl fmt::Display for DrugField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Raw Row
// =============================================================================

/// One untrusted input row, keyed by canonical field name.
///
/// Values stay as JSON so the normalizer can tell a missing cell from a
/// non-text one. Unknown keys are carried along and ignored.
pub type RawRow = BTreeMap<String, Value>;

// =============================================================================
// Drug Record
// =============================================================================

/// A persisted drug brand/manufacturer entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DrugRecord {
    /// Unique identifier (UUID v4), never reused.
    pub id: String,

    /// Brand name, trimmed and non-empty.
    pub brand_name: String,

    /// Manufacturer, trimmed and non-empty.
    pub manufacturer: String,

    pub generic_name: Option<String>,
    pub strength: Option<String>,
    pub form: Option<String>,
    pub category: Option<String>,

    /// Set once when the record is created.
    pub created_at: DateTime<Utc>,

    /// Refreshed on every successful mutation.
    pub updated_at: DateTime<Utc>,
}

impl DrugRecord {
    /// Returns the duplicate-detection key for this record.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.brand_name, &self.manufacturer)
    }

    /// Returns the value of a field as exported (absent optional = `None`).
    pub fn field(&self, field: DrugField) -> Option<&str> {
        match field {
            DrugField::BrandName => Some(&self.brand_name),
            DrugField::Manufacturer => Some(&self.manufacturer),
            DrugField::GenericName => self.generic_name.as_deref(),
            DrugField::Strength => self.strength.as_deref(),
            DrugField::Form => self.form.as_deref(),
            DrugField::Category => self.category.as_deref(),
        }
    }
}

// =============================================================================
// New Drug
// =============================================================================

/// A normalized candidate record, not yet persisted.
///
/// Only [`crate::validation::normalize`] produces these from untrusted input,
/// so holders can rely on trimmed, non-empty required fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDrug {
    pub brand_name: String,
    pub manufacturer: String,
    pub generic_name: Option<String>,
    pub strength: Option<String>,
    pub form: Option<String>,
    pub category: Option<String>,
}

impl NewDrug {
    /// Returns the duplicate-detection key for this candidate.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.brand_name, &self.manufacturer)
    }

    /// Converts back to a raw row, e.g. to re-run normalization.
    pub fn to_raw_row(&self) -> RawRow {
        let mut row = RawRow::new();
        row.insert(
            DrugField::BrandName.as_str().to_string(),
            Value::String(self.brand_name.clone()),
        );
        row.insert(
            DrugField::Manufacturer.as_str().to_string(),
            Value::String(self.manufacturer.clone()),
        );

        let optional = [
            (DrugField::GenericName, &self.generic_name),
            (DrugField::Strength, &self.strength),
            (DrugField::Form, &self.form),
            (DrugField::Category, &self.category),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                row.insert(field.as_str().to_string(), Value::String(value.clone()));
            }
        }

        row
    }
}

// =============================================================================
// Drug Patch
// =============================================================================

/// Partial update. `None` leaves a field unchanged.
///
/// For optional fields an empty string clears the stored value once the
/// patch has gone through [`crate::validation::normalize_patch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrugPatch {
    pub brand_name: Option<String>,
    pub manufacturer: Option<String>,
    pub generic_name: Option<String>,
    pub strength: Option<String>,
    pub form: Option<String>,
    pub category: Option<String>,
}

impl DrugPatch {
    /// Returns true when no field would change.
    pub fn is_empty(&self) -> bool {
        self.brand_name.is_none()
            && self.manufacturer.is_none()
            && self.generic_name.is_none()
            && self.strength.is_none()
            && self.form.is_none()
            && self.category.is_none()
    }

    /// Returns the patch value for a field.
    pub fn get(&self, field: DrugField) -> Option<&str> {
        match field {
            DrugField::BrandName => self.brand_name.as_deref(),
            DrugField::Manufacturer => self.manufacturer.as_deref(),
            DrugField::GenericName => self.generic_name.as_deref(),
            DrugField::Strength => self.strength.as_deref(),
            DrugField::Form => self.form.as_deref(),
            DrugField::Category => self.category.as_deref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, field: DrugField) -> &mut Option<String> {
        match field {
            DrugField::BrandName => &mut self.brand_name,
            DrugField::Manufacturer => &mut self.manufacturer,
            DrugField::GenericName => &mut self.generic_name,
            DrugField::Strength => &mut self.strength,
            DrugField::Form => &mut self.form,
            DrugField::Category => &mut self.category,
        }
    }
}

// =============================================================================
// Paging & Stats
// =============================================================================

/// One page of records plus the total count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugPage {
    pub total: i64,
    pub results: Vec<DrugRecord>,
}

/// Aggregate counts over the whole dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugStats {
    pub total_records: i64,
    /// Manufacturers counted case-insensitively after trimming.
    pub distinct_manufacturers: i64,
    /// Records created at or after `since`.
    pub records_added_since: i64,
    pub since: DateTime<Utc>,
    /// Count per stored form value; records without a form are left out.
    pub forms: BTreeMap<String, i64>,
    /// Count per stored category value; records without a category are left out.
    pub categories: BTreeMap<String, i64>,
}

// =============================================================================
// Name Resolution
// =============================================================================

/// One candidate for a free-text medicine name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMatch {
    pub id: String,
    pub brand_name: String,
    pub generic_name: Option<String>,
    pub strength: Option<String>,
    pub form: Option<String>,
    /// Generic name when known, otherwise the brand name.
    pub resolved_name: String,
}

impl From<DrugRecord> for NameMatch {
    fn from(record: DrugRecord) -> Self {
        let resolved_name = record
            .generic_name
            .clone()
            .unwrap_or_else(|| record.brand_name.clone());
        NameMatch {
            id: record.id,
            brand_name: record.brand_name,
            generic_name: record.generic_name,
            strength: record.strength,
            form: record.form,
            resolved_name,
        }
    }
}

/// Result of resolving a medicine name against the dictionary.
///
/// `best_match` is the first match's resolved name; `found` is false and
/// `matches` empty when nothing in the dictionary contains the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameResolution {
    pub found: bool,
    pub original_name: String,
    pub matches: Vec<NameMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_match: Option<String>,
}

impl NameResolution {
    pub fn new(original_name: impl Into<String>, records: Vec<DrugRecord>) -> Self {
        let matches: Vec<NameMatch> = records.into_iter().map(NameMatch::from).collect();
        NameResolution {
            found: !matches.is_empty(),
            original_name: original_name.into(),
            best_match: matches.first().map(|m| m.resolved_name.clone()),
            matches,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
