//! # Bulk Import Pipeline
//!
//! Turns a sequence of raw rows into stored records plus a [`BatchReport`].
//!
//! ## Per-Row Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  bad row shape ──────────────────────────────────► Failed(validation)  │
//! │                                                                         │
//! │  RawRow ──normalize──┬── rejected ───────────────► Failed(validation)  │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │                   resolve ──┬── lookup error ────► Failed(store)       │
//! │                             │                                           │
//! │                             ├── SkipDuplicate ───► Skipped             │
//! │                             │                                           │
//! │                             ▼                                           │
//! │                          insert ──┬── error ─────► Failed(store)       │
//! │                                   └── ok ────────► Inserted(id)        │
//! │                                                                         │
//! │  observer.on_row(&report) after every row                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are processed one at a time, in order. Nothing is rolled back when a
//! later row fails. Lookup and insert are separate statements, so two imports
//! racing on the same new key can both insert it.

use tracing::{debug, info, warn};

use rxdict_core::validation::{normalize, ValidationResult};
use rxdict_core::{
    dedup, BatchReport, DedupAction, ImportObserver, NewDrug, NormalizeRules, RawRow, RowFailure,
    RowOutcome, ValidationError,
};

use crate::error::DbResult;
use crate::store::DrugStore;

/// Looks the candidate's key up in the store and decides what to do with it.
pub async fn resolve(candidate: &NewDrug, store: &dyn DrugStore) -> DbResult<DedupAction> {
    let existing = store.find_by_key(&candidate.dedup_key()).await?;
    Ok(dedup::decide(candidate, existing.as_ref()))
}

/// Imports `rows` and reports one outcome per row.
///
/// Never fails as a whole: validation and store errors are recorded against
/// the row that caused them and the batch moves on.
pub async fn import_rows(
    store: &dyn DrugStore,
    rows: &[RawRow],
    rules: &NormalizeRules,
    observer: &dyn ImportObserver,
) -> BatchReport {
    run_batch(store, rows.iter().map(Ok::<_, &ValidationError>), rules, observer).await
}

/// Like [`import_rows`], for input whose rows were already checked for shape
/// (see `rxdict_core::columns::canonicalize_rows`). An `Err` row is recorded
/// as a validation failure at its position and the batch continues.
pub async fn import_checked_rows(
    store: &dyn DrugStore,
    rows: &[ValidationResult<RawRow>],
    rules: &NormalizeRules,
    observer: &dyn ImportObserver,
) -> BatchReport {
    run_batch(store, rows.iter().map(Result::as_ref), rules, observer).await
}

async fn run_batch<'a, I>(
    store: &dyn DrugStore,
    rows: I,
    rules: &NormalizeRules,
    observer: &dyn ImportObserver,
) -> BatchReport
where
    I: ExactSizeIterator<Item = Result<&'a RawRow, &'a ValidationError>> + Send,
{
    info!(rows = rows.len(), "Starting bulk import");

    let mut report = BatchReport::with_capacity(rows.len());

    for (index, input) in rows.enumerate() {
        let row = index + 1;
        let outcome = match input {
            Ok(raw) => import_row(store, row, raw, rules).await,
            Err(e) => {
                warn!(row, error = %e, "Row rejected");
                RowOutcome::Failed {
                    row,
                    reason: RowFailure::Validation(e.clone()),
                }
            }
        };
        report.record(outcome);
        observer.on_row(&report);
    }

    info!(
        total = report.total_rows,
        inserted = report.inserted_count,
        skipped = report.skipped_count,
        failed = report.failed_count,
        "Bulk import finished"
    );

    report
}

async fn import_row(
    store: &dyn DrugStore,
    row: usize,
    raw: &RawRow,
    rules: &NormalizeRules,
) -> RowOutcome {
    let candidate = match normalize(raw, rules) {
        Ok(candidate) => candidate,
        Err(e) => {
            warn!(row, error = %e, "Row rejected");
            return RowOutcome::Failed {
                row,
                reason: RowFailure::Validation(e),
            };
        }
    };

    let action = match resolve(&candidate, store).await {
        Ok(action) => action,
        Err(e) => {
            warn!(row, error = %e, "Duplicate lookup failed");
            return RowOutcome::Failed {
                row,
                reason: e.into_row_failure(),
            };
        }
    };

    match action {
        DedupAction::SkipDuplicate { existing_id } => {
            debug!(row, existing_id = %existing_id, "Skipping duplicate");
            RowOutcome::Skipped { row, existing_id }
        }
        DedupAction::Insert => match store.insert(&candidate).await {
            Ok(record) => RowOutcome::Inserted { row, id: record.id },
            Err(e) => {
                warn!(row, error = %e, "Insert failed");
                RowOutcome::Failed {
                    row,
                    reason: e.into_row_failure(),
                }
            }
        },
    }
}

// =============================================================================
// Observers
// =============================================================================

/// Logs a progress line every `every` rows and after the last one.
pub struct ProgressLogger {
    every: usize,
    expected: usize,
}

impl ProgressLogger {
    /// `expected` is the batch size, used to log the final line.
    pub fn new(every: usize, expected: usize) -> Self {
        ProgressLogger {
            every: every.max(1),
            expected,
        }
    }
}

impl ImportObserver for ProgressLogger {
    fn on_row(&self, report: &BatchReport) {
        let done = report.total_rows;
        if done % self.every == 0 || done == self.expected {
            info!(
                processed = done,
                of = self.expected,
                inserted = report.inserted_count,
                skipped = report.skipped_count,
                failed = report.failed_count,
                "Import progress"
            );
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
