//! # Tabular Input
//!
//! Reads a CSV file into raw rows keyed by canonical field name. Header
//! resolution happens once, up front: a file without a `brand_name` or
//! `manufacturer` column is refused before any row is imported.

use std::io::Read;

use thiserror::Error;
use tracing::debug;

use rxdict_core::columns::ColumnMap;
use rxdict_core::{RawRow, ValidationError};

/// Reasons a whole file is refused.
#[derive(Debug, Error)]
pub enum TabularError {
    #[error(transparent)]
    Columns(#[from] ValidationError),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Parses CSV `input` with a header row.
///
/// Short records leave their trailing fields absent; extra cells and
/// unrecognised columns are ignored.
pub fn read_csv<R: Read>(input: R) -> Result<Vec<RawRow>, TabularError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let columns = ColumnMap::resolve(&headers)?;
    debug!(columns = ?columns.fields().collect::<Vec<_>>(), "Resolved CSV header");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<&str> = record.iter().collect();
        rows.push(columns.row(&cells));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_resolve_loosely() {
        let data = "Brand Name, MANUFACTURER ,Generic-Name,Price\nLipitor,Pfizer,Atorvastatin,12\n";
        let rows = read_csv(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["brand_name"], "Lipitor");
        assert_eq!(rows[0]["manufacturer"], "Pfizer");
        assert_eq!(rows[0]["generic_name"], "Atorvastatin");
        assert!(!rows[0].contains_key("price"));
    }

    #[test]
    fn test_missing_required_column_refuses_file() {
        let data = "brand_name,generic_name\nLipitor,Atorvastatin\n";
        let err = read_csv(data.as_bytes()).unwrap_err();

        match err {
            TabularError::Columns(ValidationError::MissingColumns { columns }) => {
                assert_eq!(columns, vec!["manufacturer".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_short_records_are_kept() {
        let data = "brand_name,manufacturer,form\nLipitor,Pfizer\n";
        let rows = read_csv(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains_key("form"));
    }
}
