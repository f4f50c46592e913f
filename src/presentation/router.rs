// Router - REST surface under /api/v1 plus health check
use crate::application::repository::DashboardRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    create_dashboard, create_widget, delete_dashboard, delete_widget, get_dashboard, get_layout,
    get_widget, health_check, list_dashboard_widgets, list_dashboards, list_widgets,
    update_dashboard, update_layout, update_widget,
};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const API_PREFIX: &str = "/api/v1";

pub fn build_router(repository: Arc<dyn DashboardRepository>) -> Router {
    let state = Arc::new(AppState { repository });

    let api = Router::new()
        .route("/dashboards", get(list_dashboards).post(create_dashboard))
        .route(
            "/dashboards/:id",
            get(get_dashboard)
                .patch(update_dashboard)
                .delete(delete_dashboard),
        )
        .route("/dashboards/:id/layout", get(get_layout).put(update_layout))
        .route("/dashboards/:id/widgets", get(list_dashboard_widgets))
        .route("/widgets", get(list_widgets).post(create_widget))
        .route(
            "/widgets/:id",
            get(get_widget).patch(update_widget).delete(delete_widget),
        );

    Router::new()
        .route("/healthz", get(health_check))
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_repository::InMemoryRepository;
    use serde_json::{json, Value};

    async fn spawn() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(Arc::new(InMemoryRepository::with_demo_data()));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health_check() {
        let base = spawn().await;
        let body = reqwest::get(format!("{}/healthz", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_status_codes() {
        let base = spawn().await;
        let client = reqwest::Client::new();

        let created = client
            .post(format!("{}/api/v1/dashboards", base))
            .json(&json!({"name": "Ops"}))
            .send()
            .await
            .unwrap();
        assert_eq!(created.status(), 201);

        let missing = client
            .get(format!("{}/api/v1/dashboards/nope", base))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);

        let invalid = client
            .post(format!("{}/api/v1/dashboards", base))
            .json(&json!({"name": ""}))
            .send()
            .await
            .unwrap();
        assert_eq!(invalid.status(), 400);
        let body: Value = invalid.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("name"));

        let malformed = client
            .put(format!("{}/api/v1/dashboards/dashboard-1/layout", base))
            .header("Content-Type", "application/json")
            .body("{\"layouts\": 3}")
            .send()
            .await
            .unwrap();
        assert_eq!(malformed.status(), 400);

        let saved = client
            .put(format!("{}/api/v1/dashboards/dashboard-1/layout", base))
            .json(&json!({"layouts": {"lg": []}}))
            .send()
            .await
            .unwrap();
        assert_eq!(saved.status(), 204);
    }

    #[tokio::test]
    async fn test_widget_listing_routes_agree() {
        let base = spawn().await;
        let by_query: Value = reqwest::get(format!("{}/api/v1/widgets?dashboardId=dashboard-1", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let by_path: Value = reqwest::get(format!("{}/api/v1/dashboards/dashboard-1/widgets", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(by_query, by_path);
        assert_eq!(by_query["widgets"].as_array().unwrap().len(), 3);
    }
}
