//! # Query & Stats Service
//!
//! Read-only operations that validate their inputs before touching the store.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use rxdict_core::validation::{clamp_limit, validate_search_query};
use rxdict_core::{
    DrugPage, DrugRecord, DrugStats, NameResolution, DEFAULT_PAGE_LIMIT, DEFAULT_SEARCH_LIMIT,
    MAX_PAGE_LIMIT, MAX_SEARCH_LIMIT, RESOLVE_MATCH_LIMIT,
};

use crate::error::DbResult;
use crate::store::DrugStore;

/// Default look-back window for [`stats`].
pub const DEFAULT_STATS_PERIOD_DAYS: u32 = 30;

/// Substring search over brand name and manufacturer.
///
/// The term is trimmed; blank or over-long terms are rejected. `limit`
/// defaults to 20 and is capped at 100.
pub async fn search(
    store: &dyn DrugStore,
    term: &str,
    limit: Option<u32>,
) -> DbResult<Vec<DrugRecord>> {
    let term = validate_search_query(term)?;
    let limit = clamp_limit(limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);

    store.search(&term, limit).await
}

/// Resolves a free-text medicine name to its closest dictionary entries.
///
/// Uses the same matching as [`search`], capped at five candidates.
pub async fn resolve_name(store: &dyn DrugStore, name: &str) -> DbResult<NameResolution> {
    let term = validate_search_query(name)?;
    let records = store.search(&term, RESOLVE_MATCH_LIMIT).await?;

    debug!(name = %term, matches = records.len(), "Resolved medicine name");
    Ok(NameResolution::new(term, records))
}

/// One page of records in insertion order.
pub async fn list(store: &dyn DrugStore, offset: u32, limit: Option<u32>) -> DbResult<DrugPage> {
    let limit = clamp_limit(limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    store.list(offset, limit).await
}

/// Aggregate counts; `records_added_since` covers records created at or
/// after `since`.
pub async fn stats(store: &dyn DrugStore, since: DateTime<Utc>) -> DbResult<DrugStats> {
    let total_records = store.count().await?;
    let distinct_manufacturers = store.count_distinct_manufacturers().await?;
    let records_added_since = store.count_created_since(since).await?;
    let forms = store.count_by_form().await?;
    let categories = store.count_by_category().await?;

    debug!(total_records, distinct_manufacturers, records_added_since, "Computed stats");

    Ok(DrugStats {
        total_records,
        distinct_manufacturers,
        records_added_since,
        since,
        forms,
        categories,
    })
}

/// Start of a look-back window of `days` ending now.
///
/// Windows reaching past the earliest representable instant start there.
pub fn period_start(days: u32) -> DateTime<Utc> {
    Utc::now()
        .checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
