//! # Batch Report
//!
//! Per-row bookkeeping for bulk import.
//!
//! ## Failure Isolation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rows:    1          2           3          4                          │
//! │           │          │           │          │                          │
//! │           ▼          ▼           ▼          ▼                          │
//! │       Inserted    Failed      Skipped    Inserted                      │
//! │                 (rejected)  (duplicate)                                │
//! │                                                                         │
//! │  One outcome per row, in input order. A bad row never stops the batch  │
//! │  and never rolls back earlier inserts.                                 │
//! │                                                                         │
//! │  inserted_count + skipped_count + failed_count == total_rows           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Progress output is not the pipeline's job: an [`ImportObserver`] is told
//! about each row as it is recorded and decides what, if anything, to print.

use std::fmt;

use serde::Serialize;

use crate::error::ValidationError;

// =============================================================================
// Row Outcome
// =============================================================================

/// Why a row was not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "error", rename_all = "snake_case")]
pub enum RowFailure {
    /// Normalization rejected the row; the store was never asked to insert it.
    Validation(ValidationError),

    /// The store failed while looking up or inserting the row.
    Store { message: String, retryable: bool },
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowFailure::Validation(e) => write!(f, "{}", e),
            RowFailure::Store { message, .. } => write!(f, "store error: {}", message),
        }
    }
}

/// Result for a single input row. `row` is the 1-based input position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Inserted { row: usize, id: String },
    Skipped { row: usize, existing_id: String },
    Failed { row: usize, reason: RowFailure },
}

impl RowOutcome {
    #[inline]
    pub fn row(&self) -> usize {
        match self {
            RowOutcome::Inserted { row, .. }
            | RowOutcome::Skipped { row, .. }
            | RowOutcome::Failed { row, .. } => *row,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RowOutcome::Failed { .. })
    }
}

// =============================================================================
// Batch Report
// =============================================================================

/// Summary of one bulk-import invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total_rows: usize,
    pub inserted_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub outcomes: Vec<RowOutcome>,
}

impl BatchReport {
    pub fn with_capacity(rows: usize) -> Self {
        BatchReport {
            outcomes: Vec::with_capacity(rows),
            ..Default::default()
        }
    }

    /// Appends an outcome and updates the counters.
    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Inserted { .. } => self.inserted_count += 1,
            RowOutcome::Skipped { .. } => self.skipped_count += 1,
            RowOutcome::Failed { .. } => self.failed_count += 1,
        }
        self.total_rows += 1;
        self.outcomes.push(outcome);
    }

    /// Outcomes of rows that were not stored.
    pub fn failures(&self) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}

// =============================================================================
// Observer
// =============================================================================

/// Receives each outcome as the pipeline records it.
pub trait ImportObserver: Send + Sync {
    /// Called after `report` has absorbed the row's outcome.
    fn on_row(&self, report: &BatchReport);
}

/// Observer that ignores every event.
pub struct NoOpObserver;

impl ImportObserver for NoOpObserver {
    fn on_row(&self, _report: &BatchReport) {}
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DrugField;

    #[test]
    fn test_counters_add_up() {
        let mut report = BatchReport::with_capacity(3);
        report.record(RowOutcome::Inserted {
            row: 1,
            id: "a".to_string(),
        });
        report.record(RowOutcome::Failed {
            row: 2,
            reason: RowFailure::Validation(ValidationError::MissingRequiredField {
                field: DrugField::BrandName,
            }),
        });
        report.record(RowOutcome::Skipped {
            row: 3,
            existing_id: "a".to_string(),
        });

        assert_eq!(report.total_rows, 3);
        assert_eq!(report.inserted_count, 1);
        assert_eq!(report.skipped_count, 1);
        assert_eq!(report.failed_count, 1);
        assert_eq!(
            report.inserted_count + report.skipped_count + report.failed_count,
            report.total_rows
        );
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.outcomes.last().map(RowOutcome::row), Some(3));
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = RowOutcome::Failed {
            row: 2,
            reason: RowFailure::Validation(ValidationError::MissingRequiredField {
                field: DrugField::BrandName,
            }),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["row"], 2);
        assert_eq!(json["reason"]["source"], "validation");
        assert_eq!(json["reason"]["error"]["kind"], "missing_required_field");
        assert_eq!(json["reason"]["error"]["field"], "brand_name");
    }

    #[test]
    fn test_failure_display() {
        let failure = RowFailure::Store {
            message: "database is locked".to_string(),
            retryable: true,
        };
        assert_eq!(failure.to_string(), "store error: database is locked");
    }
}
