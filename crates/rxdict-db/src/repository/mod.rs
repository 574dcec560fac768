//! # Repository Module
//!
//! SQLite implementations of the store traits.
//!
//! ```text
//! HTTP handler / import pipeline
//!      │
//!      │  store.find_by_key(&key)
//!      ▼
//! DrugRepository  (impl DrugStore)
//! ├── insert / get / update / delete
//! ├── list / search
//! ├── count / count_distinct_manufacturers / count_created_since
//! └── count_by_form / count_by_category
//!      │
//!      │  SQL
//!      ▼
//! SQLite `drugs` table
//! ```
//!
//! ## Available Repositories
//!
//! - [`drug::DrugRepository`] - Drug record CRUD, search and aggregates

pub mod drug;
