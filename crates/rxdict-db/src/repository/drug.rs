//! # Drug Repository
//!
//! Database operations for drug records.
//!
//! ## Key Columns
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  brand_name  "Lipitor "   ──fold_key_part──►  brand_key  "lipitor"     │
//! │  manufacturer "PFIZER"    ──fold_key_part──►  manufacturer_key "pfizer"│
//! │                                                                         │
//! │  Folding happens in Rust on every write, so find_by_key, search and    │
//! │  the distinct-manufacturer count agree with DedupKey exactly, even for │
//! │  non-ASCII text that SQLite's lower() leaves alone.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! `seq` is an AUTOINCREMENT rowid. Listing and search order by it, so
//! results come back in insertion order and deleted positions are never
//! handed out again.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use rxdict_core::dedup::fold_key_part;
use rxdict_core::{DedupKey, DrugPage, DrugPatch, DrugRecord, NewDrug};

use crate::error::{DbError, DbResult};
use crate::store::DrugStore;

/// Columns selected into [`DrugRecord`].
const RECORD_COLUMNS: &str = "id, brand_name, manufacturer, generic_name, strength, form, \
                              category, created_at, updated_at";

/// Repository for drug database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = DrugRepository::new(pool);
///
/// let created = repo.insert(&new_drug).await?;
/// let hits = repo.search("amox", 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DrugRepository {
    pool: SqlitePool,
}

impl DrugRepository {
    /// Creates a new DrugRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DrugRepository { pool }
    }

    /// Counts records per non-null value of one of the optional columns.
    async fn count_grouped(&self, column: &'static str) -> DbResult<BTreeMap<String, i64>> {
        let sql = format!(
            "SELECT {column}, COUNT(*) FROM drugs WHERE {column} IS NOT NULL GROUP BY {column}"
        );

        let rows: Vec<(String, i64)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl DrugStore for DrugRepository {
    async fn insert(&self, drug: &NewDrug) -> DbResult<DrugRecord> {
        let now = Utc::now();
        let record = DrugRecord {
            id: Uuid::new_v4().to_string(),
            brand_name: drug.brand_name.clone(),
            manufacturer: drug.manufacturer.clone(),
            generic_name: drug.generic_name.clone(),
            strength: drug.strength.clone(),
            form: drug.form.clone(),
            category: drug.category.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO drugs (
                id, brand_name, manufacturer, brand_key, manufacturer_key,
                generic_name, strength, form, category, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&record.id)
        .bind(&record.brand_name)
        .bind(&record.manufacturer)
        .bind(fold_key_part(&record.brand_name))
        .bind(fold_key_part(&record.manufacturer))
        .bind(&record.generic_name)
        .bind(&record.strength)
        .bind(&record.form)
        .bind(&record.category)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %record.id, brand = %record.brand_name, "Inserted drug");
        Ok(record)
    }

    async fn get(&self, id: &str) -> DbResult<DrugRecord> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM drugs WHERE id = ?1");

        sqlx::query_as::<_, DrugRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Drug", id))
    }

    async fn update(&self, id: &str, patch: &DrugPatch) -> DbResult<DrugRecord> {
        // Optional fields: NULL keeps the column, '' clears it.
        let sql = format!(
            r#"
            UPDATE drugs SET
                brand_name       = COALESCE(?2, brand_name),
                brand_key        = COALESCE(?3, brand_key),
                manufacturer     = COALESCE(?4, manufacturer),
                manufacturer_key = COALESCE(?5, manufacturer_key),
                generic_name = CASE WHEN ?6 IS NULL THEN generic_name WHEN ?6 = '' THEN NULL ELSE ?6 END,
                strength     = CASE WHEN ?7 IS NULL THEN strength     WHEN ?7 = '' THEN NULL ELSE ?7 END,
                form         = CASE WHEN ?8 IS NULL THEN form         WHEN ?8 = '' THEN NULL ELSE ?8 END,
                category     = CASE WHEN ?9 IS NULL THEN category     WHEN ?9 = '' THEN NULL ELSE ?9 END,
                updated_at   = ?10
            WHERE id = ?1
            RETURNING {RECORD_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, DrugRecord>(&sql)
            .bind(id)
            .bind(&patch.brand_name)
            .bind(patch.brand_name.as_deref().map(fold_key_part))
            .bind(&patch.manufacturer)
            .bind(patch.manufacturer.as_deref().map(fold_key_part))
            .bind(&patch.generic_name)
            .bind(&patch.strength)
            .bind(&patch.form)
            .bind(&patch.category)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Drug", id))?;

        debug!(id = %id, "Updated drug");
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM drugs WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Drug", id));
        }

        debug!(id = %id, "Deleted drug");
        Ok(())
    }

    async fn list(&self, offset: u32, limit: u32) -> DbResult<DrugPage> {
        let total = self.count().await?;

        let sql = format!("SELECT {RECORD_COLUMNS} FROM drugs ORDER BY seq LIMIT ?1 OFFSET ?2");
        let results = sqlx::query_as::<_, DrugRecord>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(DrugPage { total, results })
    }

    async fn find_by_key(&self, key: &DedupKey) -> DbResult<Option<DrugRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM drugs \
             WHERE brand_key = ?1 AND manufacturer_key = ?2 \
             ORDER BY seq LIMIT 1"
        );

        let found = sqlx::query_as::<_, DrugRecord>(&sql)
            .bind(key.brand())
            .bind(key.manufacturer())
            .fetch_optional(&self.pool)
            .await?;

        Ok(found)
    }

    async fn search(&self, term: &str, limit: u32) -> DbResult<Vec<DrugRecord>> {
        let needle = fold_key_part(term);
        debug!(term = %needle, limit, "Searching drugs");

        // instr() instead of LIKE: no wildcard escaping needed.
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM drugs \
             WHERE instr(brand_key, ?1) > 0 OR instr(manufacturer_key, ?1) > 0 \
             ORDER BY seq LIMIT ?2"
        );

        let results = sqlx::query_as::<_, DrugRecord>(&sql)
            .bind(&needle)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = results.len(), "Search returned drugs");
        Ok(results)
    }

    async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drugs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_distinct_manufacturers(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT manufacturer_key) FROM drugs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> DbResult<i64> {
        // RFC 3339 UTC text sorts chronologically.
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drugs WHERE created_at >= ?1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_by_form(&self) -> DbResult<BTreeMap<String, i64>> {
        self.count_grouped("form").await
    }

    async fn count_by_category(&self) -> DbResult<BTreeMap<String, i64>> {
        self.count_grouped("category").await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
