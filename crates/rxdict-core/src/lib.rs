//! # rxdict-core: Pure Rules for the Drug Dictionary
//!
//! This crate holds every decision about drug records that does not need
//! the store: normalization, column resolution, the duplicate key, and the
//! batch report the import pipeline fills in.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Rx Dictionary Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             HTTP API (axum)  /  rxdict CLI                      │   │
//! │  │    create, search, bulk-import, export, stats                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ rxdict-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  columns  │  │ validation│  │   dedup   │  │  report   │  │   │
//! │  │   │  headers  │  │ normalize │  │ DedupKey  │  │BatchReport│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          rxdict-db (Record Store + Import Pipeline)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (DrugRecord, NewDrug, DrugPatch, ...)
//! - [`columns`] - Header resolution for tabular input
//! - [`validation`] - Row normalization and query validation
//! - [`dedup`] - Duplicate key and dedup decision
//! - [`report`] - Batch report and import observer
//! - [`error`] - Domain error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod columns;
pub mod dedup;
pub mod error;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use dedup::{DedupAction, DedupKey};
pub use error::ValidationError;
pub use report::{BatchReport, ImportObserver, NoOpObserver, RowFailure, RowOutcome};
pub use types::*;
pub use validation::NormalizeRules;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default maximum length of a field, in characters.
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 255;

/// Maximum length of a search term.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 100;

/// Search results returned when the caller gives no limit.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Upper bound on search results per call.
pub const MAX_SEARCH_LIMIT: u32 = 100;

/// Page size when the caller gives no limit.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Upper bound on page size.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Candidates returned when resolving a medicine name.
pub const RESOLVE_MATCH_LIMIT: u32 = 5;
