//! # rxdict-db: Record Store & Import Pipeline
//!
//! SQLite persistence for the drug dictionary plus every operation that
//! composes store calls: bulk import, search, stats and CSV export.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Rx Dictionary Data Flow                          │
//! │                                                                         │
//! │  HTTP handler / rxdict CLI                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   rxdict-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐  │   │
//! │  │   │  import  │  │  query   │  │  export  │  │  Migrations  │  │   │
//! │  │   └────┬─────┘  └────┬─────┘  └────┬─────┘  │  (embedded)  │  │   │
//! │  │        └─────────────┼─────────────┘        └──────────────┘  │   │
//! │  │                      ▼                                         │   │
//! │  │               dyn DrugStore ◄── DrugRepository (pool.rs)       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`store`] - The `DrugStore` trait
//! - [`repository`] - SQLite repository implementation
//! - [`import`] - Bulk import pipeline
//! - [`query`] - Search, paging and stats
//! - [`export`] - CSV export
//! - [`tabular`] - CSV input with header resolution
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rxdict_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("drug_dictionary.db")).await?;
//! let report = rxdict_db::import::import_rows(&db.drugs(), &rows, &rules, &NoOpObserver).await;
//! db.close().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod import;
pub mod migrations;
pub mod pool;
pub mod query;
pub mod repository;
pub mod store;
pub mod tabular;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::DrugStore;

pub use repository::drug::DrugRepository;
