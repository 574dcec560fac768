//! # Record Store Abstraction
//!
//! The import pipeline, query service and HTTP handlers talk to persistence
//! through [`DrugStore`] so tests can swap in fakes that fail on demand.
//!
//! ```text
//! ┌──────────────────┐      ┌───────────────┐      ┌──────────────────┐
//! │ import / query   │─────►│  dyn DrugStore │◄─────│ DrugRepository   │
//! │ api handlers     │      └───────────────┘      │ (SQLite, sqlx)   │
//! └──────────────────┘                              └──────────────────┘
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rxdict_core::{DedupKey, DrugPage, DrugPatch, DrugRecord, NewDrug};

use crate::error::DbResult;

/// Persistence operations over drug records.
///
/// Every mutating call is a single statement and is durable when it returns.
/// Unknown ids yield [`crate::DbError::NotFound`]; infrastructure failures
/// yield [`crate::DbError::Unavailable`].
#[async_trait]
pub trait DrugStore: Send + Sync {
    /// Persists a normalized candidate, assigning `id` and both timestamps.
    async fn insert(&self, drug: &NewDrug) -> DbResult<DrugRecord>;

    async fn get(&self, id: &str) -> DbResult<DrugRecord>;

    /// Applies a normalized patch and refreshes `updated_at`.
    async fn update(&self, id: &str, patch: &DrugPatch) -> DbResult<DrugRecord>;

    async fn delete(&self, id: &str) -> DbResult<()>;

    /// Records in insertion order, plus the total count.
    async fn list(&self, offset: u32, limit: u32) -> DbResult<DrugPage>;

    /// Oldest record whose folded (brand, manufacturer) equals `key`.
    async fn find_by_key(&self, key: &DedupKey) -> DbResult<Option<DrugRecord>>;

    /// Records whose brand name or manufacturer contains `term`,
    /// case-insensitively, in insertion order.
    async fn search(&self, term: &str, limit: u32) -> DbResult<Vec<DrugRecord>>;

    async fn count(&self) -> DbResult<i64>;

    async fn count_distinct_manufacturers(&self) -> DbResult<i64>;

    /// Records with `created_at >= since`.
    async fn count_created_since(&self, since: DateTime<Utc>) -> DbResult<i64>;

    /// Record count per stored `form`, ignoring records without one.
    async fn count_by_form(&self) -> DbResult<BTreeMap<String, i64>>;

    /// Record count per stored `category`, ignoring records without one.
    async fn count_by_category(&self) -> DbResult<BTreeMap<String, i64>>;
}
