//! # Error Types
//!
//! Domain-specific error types for rxdict-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rxdict-core errors (this file)                                        │
//! │  └── ValidationError  - Row, field, column and query rejections        │
//! │                                                                         │
//! │  rxdict-db errors (separate crate)                                     │
//! │  └── DbError          - Store failures (NotFound, Unavailable, ...)    │
//! │                                                                         │
//! │  HTTP API errors (in app)                                              │
//! │  └── ApiError         - What clients see (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → DbError / RowFailure → ApiError → Client      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include the offending field in every message
//! 3. Errors are enum variants, never String
//! 4. Validation errors are terminal: the caller must correct the input

use serde::Serialize;
use thiserror::Error;

use crate::types::DrugField;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Row-level variants end up inside a [`BatchReport`](crate::report::BatchReport)
/// during bulk import; single-record operations return them directly.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A required field is absent, empty after trimming, or not text.
    #[error("{field} is required")]
    MissingRequiredField { field: DrugField },

    /// Field value exceeds the configured maximum length (in characters).
    #[error("{field} must be at most {max} characters")]
    FieldTooLong { field: DrugField, max: usize },

    /// Optional field holds an array or object.
    #[error("{field} must be text, a number or a boolean")]
    InvalidFieldType { field: DrugField },

    /// Two keys of one row name the same field once headers are folded.
    #[error("{field} is given by more than one column")]
    DuplicateColumn { field: DrugField },

    /// A keyed-input row that is not an object (null, text, number, list).
    #[error("row must be an object of named columns")]
    InvalidRow,

    /// Batch-level rejection: the input has no column resolving to a
    /// required field, so the whole file is refused.
    #[error("missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// Update request carried no fields.
    #[error("update must change at least one field")]
    EmptyUpdate,

    /// Search term is empty after trimming.
    #[error("search query is required")]
    EmptyQuery,

    /// Search term is longer than allowed.
    #[error("search query must be at most {max} characters")]
    QueryTooLong { max: usize },
}

// =============================================================================
// Unit Tests
// =============================================================================
