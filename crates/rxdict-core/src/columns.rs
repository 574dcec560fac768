//! Column header resolution for tabular input.
//!
//! Spreadsheet exports name their columns loosely (`Brand Name`,
//! `brand_name `, `BRAND-NAME`). Headers are folded to a canonical form
//! before rows reach [`crate::validation::normalize`]; a file with no column
//! resolving to a required field is refused as a whole.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::types::{DrugField, RawRow};
use crate::validation::ValidationResult;

/// Folds a header to its canonical form.
///
/// Trims, lowercases, and collapses runs of whitespace, `_` and `-` into a
/// single `_`.
pub fn normalize_header(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    let mut pending_sep = false;

    for c in header.trim().chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.extend(c.to_lowercase());
    }

    out
}

/// Returns the required fields none of `present` resolve to.
fn missing_required<'a>(present: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let found: Vec<DrugField> = present
        .into_iter()
        .filter_map(|h| DrugField::from_canonical(&normalize_header(h)))
        .collect();

    DrugField::REQUIRED
        .iter()
        .filter(|f| !found.contains(f))
        .map(|f| f.as_str().to_string())
        .collect()
}

// =============================================================================
// Positional (CSV) Columns
// =============================================================================

/// Maps column positions of a header row to canonical fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    slots: Vec<Option<DrugField>>,
}

impl ColumnMap {
    /// Resolves a header row.
    ///
    /// When two headers resolve to the same field the first one wins.
    /// Returns `MissingColumns` if a required field has no column.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> ValidationResult<Self> {
        let missing = missing_required(headers.iter().map(|h| h.as_ref()));
        if !missing.is_empty() {
            return Err(ValidationError::MissingColumns { columns: missing });
        }

        let mut seen = Vec::new();
        let slots = headers
            .iter()
            .map(|h| {
                let field = DrugField::from_canonical(&normalize_header(h.as_ref()))?;
                if seen.contains(&field) {
                    return None;
                }
                seen.push(field);
                Some(field)
            })
            .collect();

        Ok(ColumnMap { slots })
    }

    /// Canonical fields this header row provides, in column order.
    pub fn fields(&self) -> impl Iterator<Item = DrugField> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Builds a raw row from one record's cells.
    ///
    /// Short records simply leave trailing fields absent.
    pub fn row<S: AsRef<str>>(&self, cells: &[S]) -> RawRow {
        self.slots
            .iter()
            .zip(cells)
            .filter_map(|(slot, cell)| {
                slot.map(|f| (f.as_str().to_string(), Value::String(cell.as_ref().to_string())))
            })
            .collect()
    }
}

// =============================================================================
// Keyed (JSON) Rows
// =============================================================================

/// Re-keys a JSON object by canonical header. Unknown keys are kept (and
/// later ignored by normalization).
///
/// JSON objects carry no reliable key order, so two keys folding to the same
/// field reject the row with `DuplicateColumn` instead of picking one.
pub fn canonicalize_row(object: &Map<String, Value>) -> ValidationResult<RawRow> {
    let mut row = RawRow::new();
    for (key, value) in object {
        let canonical = normalize_header(key);
        if let Some(field) = DrugField::from_canonical(&canonical) {
            if row.contains_key(&canonical) {
                return Err(ValidationError::DuplicateColumn { field });
            }
        }
        row.entry(canonical).or_insert_with(|| value.clone());
    }
    Ok(row)
}

/// Re-keys a batch of JSON rows.
///
/// The batch is refused when no object carries a column for some required
/// field. Otherwise every row gets its own result: rows that are not objects
/// fail with `InvalidRow`, objects go through [`canonicalize_row`].
/// An empty batch is accepted and yields no rows.
pub fn canonicalize_rows(values: &[Value]) -> ValidationResult<Vec<ValidationResult<RawRow>>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let keys = values
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|o| o.keys().map(String::as_str));
    let missing = missing_required(keys);
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns { columns: missing });
    }

    Ok(values
        .iter()
        .map(|value| match value.as_object() {
            Some(object) => canonicalize_row(object),
            None => Err(ValidationError::InvalidRow),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Brand Name"), "brand_name");
        assert_eq!(normalize_header("  brand_name  "), "brand_name");
        assert_eq!(normalize_header("BRAND-NAME"), "brand_name");
        assert_eq!(normalize_header("Brand   __ Name"), "brand_name");
        assert_eq!(normalize_header("Manufacturer"), "manufacturer");
        assert_eq!(normalize_header("_Manufacturer_"), "manufacturer");
    }

    #[test]
    fn test_resolve_columns() {
        let map = ColumnMap::resolve(&["Brand Name", "Pack Size", "Manufacturer"]).unwrap();
        let fields: Vec<_> = map.fields().collect();
        assert_eq!(fields, vec![DrugField::BrandName, DrugField::Manufacturer]);

        let row = map.row(&["Lipitor", "30 tablets", "Pfizer"]);
        assert_eq!(row.len(), 2);
        assert_eq!(row["brand_name"], "Lipitor");
        assert_eq!(row["manufacturer"], "Pfizer");
    }

    #[test]
    fn test_resolve_missing_column_rejects_batch() {
        let err = ColumnMap::resolve(&["Brand Name", "Generic Name"]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingColumns {
                columns: vec!["manufacturer".to_string()]
            }
        );
    }

    #[test]
    fn test_duplicate_header_first_wins() {
        let map = ColumnMap::resolve(&["brand_name", "Manufacturer", "Brand Name"]).unwrap();
        let row = map.row(&["First", "Pfizer", "Second"]);
        assert_eq!(row["brand_name"], "First");
    }

    #[test]
    fn test_short_record() {
        let map = ColumnMap::resolve(&["Brand Name", "Manufacturer", "Form"]).unwrap();
        let row = map.row(&["Lipitor"]);
        assert_eq!(row.len(), 1);
        assert!(!row.contains_key("manufacturer"));
    }

    #[test]
    fn test_canonicalize_rows() {
        let values = vec![
            json!({"Brand Name": "Lipitor", "Manufacturer": "Pfizer"}),
            json!({"brand_name": "Amoxil", " MANUFACTURER ": "AstraZeneca", "extra": 1}),
        ];

        let rows = canonicalize_rows(&values).unwrap();
        let second = rows[1].as_ref().unwrap();
        assert_eq!(rows[0].as_ref().unwrap()["brand_name"], "Lipitor");
        assert_eq!(second["manufacturer"], "AstraZeneca");
        assert_eq!(second["extra"], 1);
    }

    #[test]
    fn test_non_object_rows_fail_alone() {
        let values = vec![
            json!({"brand_name": "Lipitor", "manufacturer": "Pfizer"}),
            Value::Null,
            json!("Zocor,Merck"),
            json!({"brand_name": "Zocor", "manufacturer": "Merck"}),
        ];

        let rows = canonicalize_rows(&values).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].is_ok());
        assert_eq!(rows[1], Err(ValidationError::InvalidRow));
        assert_eq!(rows[2], Err(ValidationError::InvalidRow));
        assert!(rows[3].is_ok());
    }

    #[test]
    fn test_colliding_headers_reject_row() {
        let object = json!({"brand_name": "X", "BRAND NAME": "", "manufacturer": "M"});
        assert_eq!(
            canonicalize_row(object.as_object().unwrap()),
            Err(ValidationError::DuplicateColumn {
                field: DrugField::BrandName
            })
        );

        // Unknown keys may collide freely.
        let object = json!({"brand_name": "X", "manufacturer": "M", "Pack Size": 1, "pack_size": 2});
        assert!(canonicalize_row(object.as_object().unwrap()).is_ok());
    }

    #[test]
    fn test_canonicalize_rows_missing_column() {
        let values = vec![json!({"Brand Name": "Lipitor"})];
        assert!(matches!(
            canonicalize_rows(&values),
            Err(ValidationError::MissingColumns { .. })
        ));

        assert!(matches!(
            canonicalize_rows(&[Value::Null]),
            Err(ValidationError::MissingColumns { .. })
        ));

        assert!(canonicalize_rows(&[]).unwrap().is_empty());
    }
}
