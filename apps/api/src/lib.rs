//! # Rx Dictionary API
//!
//! HTTP service over the drug dictionary.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          API Server                                     │
//! │                                                                         │
//! │  client ──► axum Router ──► handlers (routes.rs)                       │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                     AppState { store: Arc<dyn DrugStore>, rules }       │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                     rxdict-db (import / query / export)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (see [`config::ApiConfig`]):
//! - `RXDICT_HTTP_PORT` - listen port (default 8000)
//! - `RXDICT_BIND_ADDR` - bind address (default 0.0.0.0)
//! - `DATABASE_PATH` - SQLite file (default ./drug_dictionary.db)
//! - `RXDICT_MAX_CONNECTIONS` - pool size (default 5)
//! - `RXDICT_BUSY_TIMEOUT_MS` - SQLite lock wait (default 5000)
//! - `RXDICT_MAX_FIELD_LENGTH` - per-field character limit (default 255)

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use rxdict_core::NormalizeRules;
use rxdict_db::DrugStore;

pub use routes::router;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DrugStore>,
    pub rules: NormalizeRules,
}

impl AppState {
    pub fn new(store: Arc<dyn DrugStore>, rules: NormalizeRules) -> Self {
        AppState { store, rules }
    }
}

// =============================================================================
// Handler Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use rxdict_db::{Database, DbConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> (Router, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(Arc::new(db.drugs()), NormalizeRules::default());
        (router(state), db)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create(app: &Router, brand: &str, manufacturer: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/drugs",
            Some(json!({"brand_name": brand, "manufacturer": manufacturer})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (app, _db) = app().await;
        let (status, created) = send(
            &app,
            Method::POST,
            "/api/drugs",
            Some(json!({"Brand Name": " Lipitor ", "manufacturer": "Pfizer", "strength": "20mg"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["brand_name"], "Lipitor");
        assert_eq!(created["strength"], "20mg");

        let id = created["id"].as_str().unwrap();
        let (status, fetched) = send(&app, Method::GET, &format!("/api/drugs/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_requires_brand_name() {
        let (app, _db) = app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/drugs",
            Some(json!({"brand_name": "  ", "manufacturer": "Pfizer"})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["message"], "brand_name is required");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (app, _db) = app().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/drugs")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (app, _db) = app().await;
        let (status, body) = send(&app, Method::GET, "/api/drugs/nope", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (app, _db) = app().await;
        let id = create(&app, "Amoxil", "GSK").await;

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/drugs/{id}"),
            Some(json!({"manufacturer": "AstraZeneca", "form": "Capsule"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["manufacturer"], "AstraZeneca");
        assert_eq!(updated["form"], "Capsule");

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/drugs/{id}"),
            Some(json!({"strength": 500, "form": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["strength"], "500");
        assert_eq!(updated["form"], Value::Null);

        let (status, _) = send(&app, Method::PUT, &format!("/api/drugs/{id}"), Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/drugs/{id}"),
            Some(json!({"form": ["Tablet"]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(&app, Method::DELETE, &format!("/api/drugs/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, &format!("/api/drugs/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, &format!("/api/drugs/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search() {
        let (app, _db) = app().await;
        let id = create(&app, "Amoxil", "AstraZeneca").await;
        create(&app, "Lipitor", "Pfizer").await;

        let (status, body) = send(&app, Method::GET, "/api/drugs/search?q=amox", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["results"][0]["id"], id.as_str());

        let (status, body) = send(&app, Method::GET, "/api/drugs/search?q=", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_list_paging() {
        let (app, _db) = app().await;
        for brand in ["A", "B", "C"] {
            create(&app, brand, "Maker").await;
        }

        let (status, body) = send(&app, Method::GET, "/api/drugs?skip=1&limit=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["results"].as_array().unwrap().len(), 1);
        assert_eq!(body["results"][0]["brand_name"], "B");
    }

    #[tokio::test]
    async fn test_bulk_import_reports_each_row() {
        let (app, _db) = app().await;
        let (status, report) = send(
            &app,
            Method::POST,
            "/api/drugs/bulk-import",
            Some(json!({"rows": [
                {"Brand Name": "Lipitor", "Manufacturer": "Pfizer"},
                {"Brand Name": "", "Manufacturer": "Pfizer"},
                {"Brand Name": "Lipitor", "Manufacturer": "Pfizer"}
            ]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["total_rows"], 3);
        assert_eq!(report["inserted_count"], 1);
        assert_eq!(report["skipped_count"], 1);
        assert_eq!(report["failed_count"], 1);
        assert_eq!(report["outcomes"][1]["status"], "failed");
        assert_eq!(report["outcomes"][1]["reason"]["error"]["field"], "brand_name");
        assert_eq!(report["outcomes"][2]["status"], "skipped");
    }

    #[tokio::test]
    async fn test_bulk_import_non_object_row_fails_alone() {
        let (app, _db) = app().await;
        let (status, report) = send(
            &app,
            Method::POST,
            "/api/drugs/bulk-import",
            Some(json!({"rows": [
                {"brand_name": "Lipitor", "manufacturer": "Pfizer"},
                null,
                {"brand_name": "Zocor", "manufacturer": "Merck"},
                "Amoxil,GSK"
            ]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["total_rows"], 4);
        assert_eq!(report["inserted_count"], 2);
        assert_eq!(report["failed_count"], 2);
        assert_eq!(report["outcomes"][1]["row"], 2);
        assert_eq!(report["outcomes"][1]["reason"]["error"]["kind"], "invalid_row");
        assert_eq!(report["outcomes"][2]["status"], "inserted");
    }

    #[tokio::test]
    async fn test_bulk_import_colliding_headers_fail_row() {
        let (app, _db) = app().await;
        let (status, report) = send(
            &app,
            Method::POST,
            "/api/drugs/bulk-import",
            Some(json!({"rows": [
                {"brand_name": "X", "BRAND NAME": "", "manufacturer": "M"},
                {"brand_name": "Zocor", "manufacturer": "Merck"}
            ]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["inserted_count"], 1);
        assert_eq!(report["outcomes"][0]["reason"]["error"]["kind"], "duplicate_column");
    }

    #[tokio::test]
    async fn test_bulk_import_missing_column_refuses_batch() {
        let (app, _db) = app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/drugs/bulk-import",
            Some(json!({"rows": [{"brand_name": "Lipitor", "generic": "Atorvastatin"}]})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "missing required columns: manufacturer");

        let (_, page) = send(&app, Method::GET, "/api/drugs", None).await;
        assert_eq!(page["total"], 0);
    }

    #[tokio::test]
    async fn test_stats() {
        let (app, _db) = app().await;
        create(&app, "Lipitor", "Pfizer").await;
        create(&app, "Viagra", "pfizer").await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/drugs",
            Some(json!({"brand_name": "Zocor", "manufacturer": "Merck", "form": "Tablet", "category": "Statin"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, Method::GET, "/api/drugs/stats?since_days=7", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_records"], 3);
        assert_eq!(body["distinct_manufacturers"], 2);
        assert_eq!(body["records_added_since"], 3);
        assert_eq!(body["forms"], json!({"Tablet": 1}));
        assert_eq!(body["categories"], json!({"Statin": 1}));
    }

    #[tokio::test]
    async fn test_stats_with_huge_window() {
        let (app, _db) = app().await;
        create(&app, "Lipitor", "Pfizer").await;

        let (status, body) = send(&app, Method::GET, "/api/drugs/stats?since_days=100000000", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["records_added_since"], 1);
    }

    #[tokio::test]
    async fn test_resolve() {
        let (app, _db) = app().await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/drugs",
            Some(json!({"brand_name": "Lipitor", "manufacturer": "Pfizer", "generic_name": "Atorvastatin"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, Method::GET, "/api/drugs/resolve/lipitor", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["found"], true);
        assert_eq!(body["original_name"], "lipitor");
        assert_eq!(body["best_match"], "Atorvastatin");
        assert_eq!(body["matches"][0]["brand_name"], "Lipitor");

        let (status, body) = send(&app, Method::GET, "/api/drugs/resolve/paracetamol", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["found"], false);
        assert_eq!(body["matches"], json!([]));
        assert!(body.get("best_match").is_none());
    }

    #[tokio::test]
    async fn test_export_csv() {
        let (app, _db) = app().await;
        create(&app, "Lipitor", "Pfizer").await;

        let request = Request::builder()
            .uri("/api/drugs/export/csv")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/csv; charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("id,brand_name,manufacturer"));
        assert!(lines.next().unwrap().contains("Lipitor,Pfizer"));
    }

    #[tokio::test]
    async fn test_closed_store_is_unavailable() {
        let (app, db) = app().await;
        db.close().await;

        let (status, body) = send(&app, Method::GET, "/api/drugs/stats", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "STORE_UNAVAILABLE");

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _db) = app().await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "store": true}));
    }
}
