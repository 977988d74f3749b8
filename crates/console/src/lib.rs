//! Girder Console — JSON dashboard API served from the binary.
//!
//! Read endpoints back the dashboard pages (KPIs, projects, finance,
//! inventory, procurement, HR); the write endpoints are the manual sync
//! trigger and the settings update.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use girder_core::config::GirderConfig;
use girder_core::db::repository::{
    DashboardRepository, EmployeeRepository, FinanceRepository, InventoryRepository,
    ProjectRepository, PurchaseOrderRepository, SyncRunRepository,
};
use girder_core::db::sqlite::SqliteRepository;
use girder_core::error::GirderError;
use girder_core::models::common::{FinanceKind, ProjectStatus};
use girder_core::models::sync::ProjectFilter;
use girder_core::sources::SourceDispatcher;

const LIST_LIMIT: i64 = 100;

/// Shared application state for all console routes.
pub struct AppState {
    pub repo: SqliteRepository,
    pub dispatcher: Arc<SourceDispatcher<SqliteRepository>>,
    pub config: GirderConfig,
}

/// Build the console router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/kpis/summary", get(kpi_summary))
        .route("/api/kpis/budget-variance", get(budget_variance))
        .route("/api/projects", get(list_projects))
        .route("/api/finance/:kind", get(list_finance))
        .route("/api/inventory/stocks", get(list_inventory))
        .route("/api/procurement/pos", get(list_purchase_orders))
        .route("/api/hr/employees", get(list_employees))
        .route("/api/sync/latest", get(latest_sync))
        .route("/api/sync", post(sync_trigger))
        .route("/api/settings", post(save_settings))
        .with_state(state)
}

fn internal_error(e: GirderError) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": e.to_string()})),
    )
}

// -- Health --

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let source = state.dispatcher.active_source().await;
    Json(json!({
        "status": "healthy",
        "instance": state.config.girder.instance_name,
        "dataSource": source.as_str(),
    }))
}

// -- KPIs --

async fn kpi_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.repo.kpi_summary().await {
        Ok(summary) => (StatusCode::OK, Json(json!(summary))),
        Err(e) => internal_error(e),
    }
}

async fn budget_variance(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.repo.budget_variance(5).await {
        Ok(variance) => (StatusCode::OK, Json(json!(variance))),
        Err(e) => internal_error(e),
    }
}

// -- Entity lists --

#[derive(Debug, Default, Deserialize)]
struct ProjectsQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    client: Option<String>,
}

async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProjectsQuery>,
) -> impl IntoResponse {
    let status = match params.status.as_deref() {
        Some("Planning") => Some(ProjectStatus::Planning),
        Some("In Progress") => Some(ProjectStatus::InProgress),
        Some("On Hold") => Some(ProjectStatus::OnHold),
        Some("Completed") => Some(ProjectStatus::Completed),
        _ => None,
    };
    let filter = ProjectFilter {
        status,
        client: params.client,
    };

    match state.repo.list_projects(&filter).await {
        Ok(projects) => (StatusCode::OK, Json(json!(projects))),
        Err(e) => internal_error(e),
    }
}

async fn list_finance(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> impl IntoResponse {
    let kind = match kind.as_str() {
        "invoices" => FinanceKind::Invoice,
        "payments" => FinanceKind::Payment,
        "expenses" => FinanceKind::Expense,
        other => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": format!("unknown finance kind '{other}'")})),
            );
        }
    };

    match state.repo.list_finance_records(Some(kind), LIST_LIMIT).await {
        Ok(records) => (StatusCode::OK, Json(json!(records))),
        Err(e) => internal_error(e),
    }
}

async fn list_inventory(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.repo.list_inventory_items(LIST_LIMIT).await {
        Ok(items) => (StatusCode::OK, Json(json!(items))),
        Err(e) => internal_error(e),
    }
}

async fn list_purchase_orders(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.repo.list_purchase_orders(LIST_LIMIT).await {
        Ok(pos) => (StatusCode::OK, Json(json!(pos))),
        Err(e) => internal_error(e),
    }
}

async fn list_employees(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.repo.list_employees(LIST_LIMIT).await {
        Ok(employees) => (StatusCode::OK, Json(json!(employees))),
        Err(e) => internal_error(e),
    }
}

// -- Sync --

async fn latest_sync(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.repo.latest_sync_run().await {
        Ok(Some(run)) => (StatusCode::OK, Json(json!(run))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "no sync has run yet"})),
        ),
        Err(e) => internal_error(e),
    }
}

/// Manual sync trigger: takes no parameters, returns `{message, details}`.
async fn sync_trigger(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.dispatcher.sync().await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "message": "Sync completed successfully",
                "details": outcome,
            })),
        ),
        Err(GirderError::ConcurrentSync) => (
            StatusCode::CONFLICT,
            Json(json!({"error": "a sync is already running"})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("sync failed: {e}")})),
        ),
    }
}

// -- Settings --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsRequest {
    data_source: String,
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    api_secret: Option<String>,
}

/// Apply a configuration update: switch the active source and override the
/// ERPNext connection settings for subsequent syncs.
async fn save_settings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SettingsRequest>,
) -> impl IntoResponse {
    if let Err(e) = state.dispatcher.set_active_source(&request.data_source).await {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": e.to_string()})),
        );
    }

    if request.api_url.is_some() || request.api_key.is_some() || request.api_secret.is_some() {
        let mut erpnext = state.dispatcher.erpnext_config().await;
        if let Some(url) = request.api_url {
            erpnext.base_url = url;
        }
        if let Some(key) = request.api_key {
            erpnext.api_key = key;
        }
        if let Some(secret) = request.api_secret {
            erpnext.api_secret = secret;
        }
        state.dispatcher.set_erpnext_config(erpnext).await;
    }

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": format!("Configuration saved, active source is now {}", request.data_source),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use girder_core::config::{DatabaseConfig, ErpNextConfig, GirderSection, SourceConfig};
    use girder_core::db::DatabasePool;
    use girder_core::models::sync::SyncStatus;
    use girder_core::sources::SourceKind;
    use tower::ServiceExt;

    fn test_config() -> GirderConfig {
        GirderConfig {
            girder: GirderSection {
                instance_name: "Test Instance".to_string(),
                data_dir: "/tmp/girder-test".to_string(),
                database: DatabaseConfig {
                    path: Some(":memory:".to_string()),
                },
            },
            source: SourceConfig::default(),
        }
    }

    async fn test_state(source: SourceKind) -> Arc<AppState> {
        let pool = DatabasePool::new_sqlite_memory().await.unwrap();
        let repo = match pool {
            DatabasePool::Sqlite(p) => SqliteRepository::new(p),
        };
        let dispatcher = Arc::new(SourceDispatcher::new(
            Arc::new(repo.clone()),
            source,
            ErpNextConfig::default(),
        ));
        Arc::new(AppState {
            repo,
            dispatcher,
            config: test_config(),
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_active_source() {
        let app = router(test_state(SourceKind::Mock).await);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["dataSource"], "mock");
    }

    #[tokio::test]
    async fn sync_trigger_returns_message_and_details() {
        let app = router(test_state(SourceKind::CivitBuild).await);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sync")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Sync completed successfully");
        assert_eq!(body["details"]["outcome"], "notImplemented");
        assert_eq!(body["details"]["source"], "civitbuild");
    }

    #[tokio::test]
    async fn mock_sync_trigger_seeds_and_reports() {
        let state = test_state(SourceKind::Mock).await;
        let app = router(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sync")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["details"]["outcome"], "seeded");
        assert_eq!(body["details"]["summary"]["clients"], 20);

        let run = state.repo.latest_sync_run().await.unwrap().unwrap();
        assert_eq!(run.status, SyncStatus::Completed);
    }

    #[tokio::test]
    async fn projects_endpoint_lists_seeded_rows() {
        let state = test_state(SourceKind::Mock).await;
        state.dispatcher.sync().await.unwrap();

        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/projects")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body.as_array().unwrap().len() > 40);
    }

    #[tokio::test]
    async fn projects_endpoint_applies_status_filter() {
        let state = test_state(SourceKind::Mock).await;
        state.dispatcher.sync().await.unwrap();

        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/projects?status=Completed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        for project in body.as_array().unwrap() {
            assert_eq!(project["status"], "Completed");
        }
    }

    #[tokio::test]
    async fn finance_endpoint_rejects_unknown_kind() {
        let app = router(test_state(SourceKind::Mock).await);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/finance/frobnications")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn finance_endpoint_lists_by_kind() {
        let state = test_state(SourceKind::Mock).await;
        state.dispatcher.sync().await.unwrap();

        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/finance/invoices")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        for record in body.as_array().unwrap() {
            assert_eq!(record["kind"], "invoice");
        }
    }

    #[tokio::test]
    async fn kpi_summary_endpoint_returns_figures() {
        let state = test_state(SourceKind::Mock).await;
        state.dispatcher.sync().await.unwrap();

        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/kpis/summary")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["totalRevenue"].is_string());
        assert!(body["activeProjects"].is_number());
    }

    #[tokio::test]
    async fn budget_variance_endpoint_caps_at_five() {
        let state = test_state(SourceKind::Mock).await;
        state.dispatcher.sync().await.unwrap();

        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/kpis/budget-variance")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert!(body.as_array().unwrap().len() <= 5);
    }

    #[tokio::test]
    async fn latest_sync_is_404_before_first_run() {
        let app = router(test_state(SourceKind::Mock).await);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/sync/latest")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn settings_rejects_invalid_source() {
        let app = router(test_state(SourceKind::Mock).await);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/settings")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"dataSource": "bogus"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("bogus"));
    }

    #[tokio::test]
    async fn settings_switches_source_and_overrides_erpnext() {
        let state = test_state(SourceKind::Mock).await;
        let app = router(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/settings")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"dataSource": "erpnext", "apiUrl": "https://erp.example.com", "apiKey": "k", "apiSecret": "s"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(state.dispatcher.active_source().await, SourceKind::ErpNext);
        let erpnext = state.dispatcher.erpnext_config().await;
        assert_eq!(erpnext.base_url, "https://erp.example.com");
        assert_eq!(erpnext.api_key, "k");
    }

    #[tokio::test]
    async fn employee_and_inventory_endpoints_respond() {
        let state = test_state(SourceKind::Mock).await;
        state.dispatcher.sync().await.unwrap();
        let app = router(state);

        for uri in [
            "/api/hr/employees",
            "/api/inventory/stocks",
            "/api/procurement/pos",
        ] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "endpoint {uri}");
            let body = body_json(response).await;
            assert!(!body.as_array().unwrap().is_empty(), "endpoint {uri}");
        }
    }
}
