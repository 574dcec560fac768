//! # CSV Export
//!
//! Writes every record as one flat CSV row, in insertion order, preceded by
//! a header row. Absent optional fields are empty cells; timestamps are
//! RFC 3339.

use std::io::Write;

use chrono::SecondsFormat;
use thiserror::Error;
use tracing::info;

use rxdict_core::{DrugField, DrugRecord, MAX_PAGE_LIMIT};

use crate::error::DbError;
use crate::store::DrugStore;

/// Export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] DbError),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Header row of the export.
pub fn header() -> Vec<&'static str> {
    let mut header = Vec::with_capacity(DrugField::ALL.len() + 3);
    header.push("id");
    header.extend(DrugField::ALL.iter().map(|f| f.as_str()));
    header.push("created_at");
    header.push("updated_at");
    header
}

fn record_cells(record: &DrugRecord) -> Vec<String> {
    let mut cells = Vec::with_capacity(DrugField::ALL.len() + 3);
    cells.push(record.id.clone());
    cells.extend(
        DrugField::ALL
            .iter()
            .map(|f| record.field(*f).unwrap_or_default().to_string()),
    );
    cells.push(record.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    cells.push(record.updated_at.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    cells
}

/// Streams all records to `out`, a page at a time. Returns the row count.
pub async fn write_csv<W: Write>(store: &dyn DrugStore, out: W) -> Result<usize, ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(header())?;

    let mut offset = 0u32;
    let mut written = 0usize;
    loop {
        let page = store.list(offset, MAX_PAGE_LIMIT).await?;
        if page.results.is_empty() {
            break;
        }

        for record in &page.results {
            writer.write_record(record_cells(record))?;
        }
        written += page.results.len();
        offset += page.results.len() as u32;
    }

    writer.flush()?;
    info!(rows = written, "Exported drugs to CSV");
    Ok(written)
}

/// Convenience wrapper returning the CSV document as bytes.
pub async fn export_csv(store: &dyn DrugStore) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    write_csv(store, &mut buf).await?;
    Ok(buf)
}
