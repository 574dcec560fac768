//! # Drug Routes
//!
//! ```text
//! GET    /api/drugs                  list (skip, limit)
//! POST   /api/drugs                  create
//! GET    /api/drugs/search           search (q, limit)
//! POST   /api/drugs/bulk-import      bulk import {"rows": [...]}
//! GET    /api/drugs/export/csv       CSV export
//! GET    /api/drugs/stats            stats (since_days)
//! GET    /api/drugs/resolve/{name}   resolve a medicine name
//! GET    /api/drugs/{id}             read
//! PUT    /api/drugs/{id}             partial update
//! DELETE /api/drugs/{id}             delete
//! GET    /health                     liveness + store check
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use rxdict_core::columns::{canonicalize_row, canonicalize_rows};
use rxdict_core::validation::{normalize, normalize_patch, patch_from_row};
use rxdict_core::{BatchReport, DrugPage, DrugRecord, DrugStats, NameResolution};
use rxdict_db::export;
use rxdict_db::import::{import_checked_rows, ProgressLogger};
use rxdict_db::query::{self, DEFAULT_STATS_PERIOD_DAYS};

use crate::error::ApiResult;
use crate::AppState;

/// Progress line interval for HTTP bulk imports.
const IMPORT_PROGRESS_EVERY: usize = 500;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/drugs", get(list_drugs).post(create_drug))
        .route("/api/drugs/search", get(search_drugs))
        .route("/api/drugs/bulk-import", post(bulk_import))
        .route("/api/drugs/export/csv", get(export_csv))
        .route("/api/drugs/stats", get(drug_stats))
        .route("/api/drugs/resolve/{name}", get(resolve_name))
        .route(
            "/api/drugs/{id}",
            get(get_drug).put(update_drug).delete(delete_drug),
        )
        .with_state(state)
}

// =============================================================================
// Request / Response Shapes
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: u32,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub since_days: Option<u32>,
}

/// Rows stay untyped so one malformed row fails on its own.
#[derive(Debug, Deserialize)]
pub struct BulkImportRequest {
    pub rows: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total: usize,
    pub results: Vec<DrugRecord>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    store: bool,
}

// =============================================================================
// Handlers
// =============================================================================

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.count().await.is_ok();
    let status = if store {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if store { "ok" } else { "degraded" },
        store,
    };
    (status, Json(body))
}

async fn list_drugs(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<DrugPage>> {
    let Query(params) = params?;
    let page = query::list(state.store.as_ref(), params.skip, params.limit).await?;
    Ok(Json(page))
}

async fn create_drug(
    State(state): State<AppState>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DrugRecord>)> {
    let Json(body) = body?;
    let candidate = normalize(&canonicalize_row(&body)?, &state.rules)?;

    let record = state.store.insert(&candidate).await?;
    info!(id = %record.id, brand = %record.brand_name, "Drug created");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_drug(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DrugRecord>> {
    Ok(Json(state.store.get(&id).await?))
}

async fn update_drug(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<Json<DrugRecord>> {
    let Json(body) = body?;
    let patch = patch_from_row(&canonicalize_row(&body)?)?;
    let patch = normalize_patch(&patch, &state.rules)?;

    let record = state.store.update(&id, &patch).await?;
    info!(id = %record.id, "Drug updated");
    Ok(Json(record))
}

async fn delete_drug(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete(&id).await?;
    info!(id = %id, "Drug deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn search_drugs(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let Query(params) = params?;
    let results = query::search(state.store.as_ref(), &params.q, params.limit).await?;
    Ok(Json(SearchResponse {
        total: results.len(),
        results,
    }))
}

async fn bulk_import(
    State(state): State<AppState>,
    body: Result<Json<BulkImportRequest>, JsonRejection>,
) -> ApiResult<Json<BatchReport>> {
    let Json(request) = body?;
    let rows = canonicalize_rows(&request.rows).inspect_err(|e| warn!(error = %e, "Batch refused"))?;

    let observer = ProgressLogger::new(IMPORT_PROGRESS_EVERY, rows.len());
    let report = import_checked_rows(state.store.as_ref(), &rows, &state.rules, &observer).await;
    Ok(Json(report))
}

async fn export_csv(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = export::export_csv(state.store.as_ref()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"drug_dictionary.csv\"",
            ),
        ],
        body,
    ))
}

async fn drug_stats(
    State(state): State<AppState>,
    params: Result<Query<StatsParams>, QueryRejection>,
) -> ApiResult<Json<DrugStats>> {
    let Query(params) = params?;
    let days = params.since_days.unwrap_or(DEFAULT_STATS_PERIOD_DAYS);
    let stats = query::stats(state.store.as_ref(), query::period_start(days)).await?;
    Ok(Json(stats))
}

async fn resolve_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<NameResolution>> {
    Ok(Json(query::resolve_name(state.store.as_ref(), &name).await?))
}
