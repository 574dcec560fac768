//! # Validation Module
//!
//! Normalization of untrusted rows into [`NewDrug`] values.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Boundary (CLI / HTTP)                                        │
//! │  ├── Column header resolution (columns.rs)                             │
//! │  └── Batch-level rejection when a required column is missing           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (pure, no store access)                          │
//! │  ├── Required fields present, text, non-empty after trim               │
//! │  ├── Length limit per field                                            │
//! │  └── Optional fields trimmed, empty → absent                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL constraints                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rxdict_core::validation::{normalize, NormalizeRules};
//! use rxdict_core::RawRow;
//!
//! let mut row = RawRow::new();
//! row.insert("brand_name".into(), "  Lipitor ".into());
//! row.insert("manufacturer".into(), "Pfizer".into());
//!
//! let drug = normalize(&row, &NormalizeRules::default()).unwrap();
//! assert_eq!(drug.brand_name, "Lipitor");
//! ```

use serde_json::Value;

use crate::error::ValidationError;
use crate::types::{DrugField, DrugPatch, NewDrug, RawRow};
use crate::{DEFAULT_MAX_FIELD_LENGTH, MAX_SEARCH_QUERY_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Rules
// =============================================================================

/// Tunable normalization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeRules {
    /// Maximum length of any field, in characters, after trimming.
    pub max_field_len: usize,
}

impl NormalizeRules {
    pub fn new(max_field_len: usize) -> Self {
        NormalizeRules { max_field_len }
    }
}

impl Default for NormalizeRules {
    fn default() -> Self {
        NormalizeRules::new(DEFAULT_MAX_FIELD_LENGTH)
    }
}

// =============================================================================
// Row Normalization
// =============================================================================

/// Normalizes a raw row into a candidate record.
///
/// ## Rules
/// - `brand_name` and `manufacturer` must be text and non-empty after trimming,
///   otherwise `MissingRequiredField`
/// - Any field longer than `rules.max_field_len` characters → `FieldTooLong`
/// - Optional fields accept text, numbers and booleans; null/empty → absent
/// - Unknown keys are ignored
///
/// Required fields are checked first, in declaration order, so the reported
/// reason is stable for rows with several problems.
pub fn normalize(row: &RawRow, rules: &NormalizeRules) -> ValidationResult<NewDrug> {
    let brand_name = required_text(row, DrugField::BrandName, rules)?;
    let manufacturer = required_text(row, DrugField::Manufacturer, rules)?;

    Ok(NewDrug {
        brand_name,
        manufacturer,
        generic_name: optional_text(row, DrugField::GenericName, rules)?,
        strength: optional_text(row, DrugField::Strength, rules)?,
        form: optional_text(row, DrugField::Form, rules)?,
        category: optional_text(row, DrugField::Category, rules)?,
    })
}

fn required_text(row: &RawRow, field: DrugField, rules: &NormalizeRules) -> ValidationResult<String> {
    let text = match row.get(field.as_str()) {
        Some(Value::String(s)) => s.trim(),
        _ => "",
    };

    if text.is_empty() {
        return Err(ValidationError::MissingRequiredField { field });
    }

    check_length(text, field, rules)?;
    Ok(text.to_string())
}

fn optional_text(
    row: &RawRow,
    field: DrugField,
    rules: &NormalizeRules,
) -> ValidationResult<Option<String>> {
    let Some(text) = scalar_text(row.get(field.as_str()), field)? else {
        return Ok(None);
    };

    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    check_length(text, field, rules)?;
    Ok(Some(text.to_string()))
}

/// Text form of an optional cell. Null is absent; lists and objects are
/// rejected.
fn scalar_text(value: Option<&Value>, field: DrugField) -> ValidationResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(Value::Array(_)) | Some(Value::Object(_)) => {
            Err(ValidationError::InvalidFieldType { field })
        }
    }
}

fn check_length(text: &str, field: DrugField, rules: &NormalizeRules) -> ValidationResult<()> {
    if text.chars().count() > rules.max_field_len {
        return Err(ValidationError::FieldTooLong {
            field,
            max: rules.max_field_len,
        });
    }
    Ok(())
}

// =============================================================================
// Patch Normalization
// =============================================================================

/// Reads a partial update from a keyed row, with the same cell rules as
/// [`normalize`]: required fields must be text, optional fields take text,
/// numbers or booleans. Absent and null cells leave the field unchanged.
///
/// The result still has to go through [`normalize_patch`].
pub fn patch_from_row(row: &RawRow) -> ValidationResult<DrugPatch> {
    let mut patch = DrugPatch::default();
    for field in DrugField::ALL {
        let value = row.get(field.as_str());
        let text = match value {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(_) if field.is_required() => {
                return Err(ValidationError::MissingRequiredField { field })
            }
            other => scalar_text(other, field)?,
        };
        *patch.slot_mut(field) = text;
    }
    Ok(patch)
}

/// Normalizes a partial update.
///
/// Only supplied fields are checked. Required fields may not be blanked;
/// optional fields supplied as blank become `Some("")`, which the store reads
/// as "clear this value".
pub fn normalize_patch(patch: &DrugPatch, rules: &NormalizeRules) -> ValidationResult<DrugPatch> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }

    let mut normalized = DrugPatch::default();
    for field in DrugField::ALL {
        let Some(value) = patch.get(field) else {
            continue;
        };

        let value = value.trim();
        if value.is_empty() && field.is_required() {
            return Err(ValidationError::MissingRequiredField { field });
        }
        check_length(value, field, rules)?;

        *normalized.slot_mut(field) = Some(value.to_string());
    }

    Ok(normalized)
}

// =============================================================================
// Query Validators
// =============================================================================

/// Validates a search term.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed term.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }

    if query.chars().count() > MAX_SEARCH_QUERY_LENGTH {
        return Err(ValidationError::QueryTooLong {
            max: MAX_SEARCH_QUERY_LENGTH,
        });
    }

    Ok(query.to_string())
}

/// Applies a default and an upper bound to a caller-supplied limit.
///
/// Zero is treated as "not supplied".
pub fn clamp_limit(requested: Option<u32>, default: u32, max: u32) -> u32 {
    match requested {
        Some(0) | None => default,
        Some(n) => n.min(max),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
