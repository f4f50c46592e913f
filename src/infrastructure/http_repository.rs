// HTTP repository implementation against the dashboard REST API
use crate::application::error::{DashboardError, Result};
use crate::application::repository::DashboardRepository;
use crate::domain::dashboard::{CreateDashboard, Dashboard, UpdateDashboard};
use crate::domain::ids::{DashboardId, WidgetId};
use crate::domain::layout::{DashboardLayout, GridLayout};
use crate::domain::widget::{CreateWidget, WidgetInstance};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct HttpDashboardRepository {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DashboardList {
    dashboards: Vec<Dashboard>,
}

#[derive(Debug, Deserialize)]
struct WidgetList {
    widgets: Vec<WidgetInstance>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct LayoutBody<'a> {
    layouts: &'a GridLayout,
}

#[derive(Serialize)]
struct WidgetPatch {
    config: Map<String, Value>,
}

impl HttpDashboardRepository {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await?;
        Ok(response)
    }

    /// Fail on any non-success status, mapping 404 to `NotFound`.
    async fn check(response: Response, entity: &'static str, id: &str) -> Result<Response> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DashboardError::not_found(entity, id));
        }
        Self::check_status(response).await
    }

    /// Fail on any non-success status. Collection endpoints always exist,
    /// so a 404 from one is reported as a rejection.
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        let message = if message.is_empty() {
            status.to_string()
        } else {
            message
        };
        tracing::warn!("Dashboard API rejected request with {}: {}", status, message);
        Err(DashboardError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET that reads a 404 as absence.
    async fn fetch<T: DeserializeOwned>(&self, url: String, entity: &'static str, id: &str) -> Result<Option<T>> {
        let response = self.send(self.client.get(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("{} {} not found at {}", entity, id, url);
            return Ok(None);
        }
        let response = Self::check(response, entity, id).await?;
        Ok(Some(Self::decode(response).await?))
    }
}

#[async_trait]
impl DashboardRepository for HttpDashboardRepository {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>> {
        let response = self.send(self.client.get(self.url(&["dashboards"]))).await?;
        let response = Self::check_status(response).await?;
        let list: DashboardList = Self::decode(response).await?;
        Ok(list.dashboards)
    }

    async fn get_dashboard(&self, id: &DashboardId) -> Result<Option<Dashboard>> {
        self.fetch(self.url(&["dashboards", id.as_str()]), "dashboard", id.as_str())
            .await
    }

    async fn get_layout(&self, id: &DashboardId) -> Result<Option<DashboardLayout>> {
        self.fetch(
            self.url(&["dashboards", id.as_str(), "layout"]),
            "layout",
            id.as_str(),
        )
        .await
    }

    async fn create_dashboard(&self, input: CreateDashboard) -> Result<Dashboard> {
        input.validate()?;
        let request = self.client.post(self.url(&["dashboards"])).json(&input);
        let response = Self::check(self.send(request).await?, "dashboard", &input.name).await?;
        Self::decode(response).await
    }

    async fn update_dashboard(&self, id: &DashboardId, input: UpdateDashboard) -> Result<Dashboard> {
        input.validate()?;
        let request = self
            .client
            .patch(self.url(&["dashboards", id.as_str()]))
            .json(&input);
        let response = Self::check(self.send(request).await?, "dashboard", id.as_str()).await?;
        Self::decode(response).await
    }

    async fn update_layout(&self, id: &DashboardId, layouts: &GridLayout) -> Result<()> {
        layouts.validate()?;
        let request = self
            .client
            .put(self.url(&["dashboards", id.as_str(), "layout"]))
            .json(&LayoutBody { layouts });
        Self::check(self.send(request).await?, "layout", id.as_str()).await?;
        Ok(())
    }

    async fn delete_dashboard(&self, id: &DashboardId) -> Result<()> {
        let request = self.client.delete(self.url(&["dashboards", id.as_str()]));
        Self::check(self.send(request).await?, "dashboard", id.as_str()).await?;
        Ok(())
    }

    async fn list_widgets(&self, dashboard_id: Option<&DashboardId>) -> Result<Vec<WidgetInstance>> {
        let mut request = self.client.get(self.url(&["widgets"]));
        if let Some(id) = dashboard_id {
            request = request.query(&[("dashboardId", id.as_str())]);
        }
        let response = Self::check_status(self.send(request).await?).await?;
        let list: WidgetList = Self::decode(response).await?;
        Ok(list.widgets)
    }

    async fn get_widget(&self, id: &WidgetId) -> Result<Option<WidgetInstance>> {
        self.fetch(self.url(&["widgets", id.as_str()]), "widget", id.as_str())
            .await
    }

    async fn create_widget(&self, input: CreateWidget) -> Result<WidgetInstance> {
        input.validate()?;
        let request = self.client.post(self.url(&["widgets"])).json(&input);
        let response =
            Self::check(self.send(request).await?, "dashboard", input.dashboard_id.as_str()).await?;
        Self::decode(response).await
    }

    async fn update_widget(&self, id: &WidgetId, config: Map<String, Value>) -> Result<WidgetInstance> {
        let request = self
            .client
            .patch(self.url(&["widgets", id.as_str()]))
            .json(&WidgetPatch { config });
        let response = Self::check(self.send(request).await?, "widget", id.as_str()).await?;
        Self::decode(response).await
    }

    async fn delete_widget(&self, id: &WidgetId) -> Result<()> {
        let request = self.client.delete(self.url(&["widgets", id.as_str()]));
        Self::check(self.send(request).await?, "widget", id.as_str()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout::{Breakpoint, GridPlacement};
    use crate::infrastructure::memory_repository::InMemoryRepository;
    use crate::presentation::router::build_router;
    use serde_json::json;
    use std::sync::Arc;

    async fn spawn_backend() -> HttpDashboardRepository {
        let backend = Arc::new(InMemoryRepository::with_demo_data());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(backend)).await.unwrap();
        });
        HttpDashboardRepository::new(format!("http://{}/api/v1", addr))
    }

    fn dashboard() -> DashboardId {
        DashboardId::new("dashboard-1")
    }

    #[test]
    fn test_url_encodes_segments() {
        let repo = HttpDashboardRepository::new("http://localhost:8080/api/v1/");
        assert_eq!(
            repo.url(&["dashboards", "a b/c", "layout"]),
            "http://localhost:8080/api/v1/dashboards/a%20b%2Fc/layout"
        );
    }

    #[tokio::test]
    async fn test_layout_round_trip_preserves_item_fields() {
        let repo = spawn_backend().await;
        let item = GridPlacement::new(0, 0, 3, 4).with_min(2, 2).at("w1".into());
        let layouts = GridLayout::new().with_breakpoint(Breakpoint::Lg, vec![item.clone()]);

        repo.update_layout(&dashboard(), &layouts).await.unwrap();
        let fetched = repo.get_layout(&dashboard()).await.unwrap().unwrap();

        let stored = &fetched.layouts.items(Breakpoint::Lg).unwrap()[0];
        assert_eq!(stored, &item);
        assert_eq!(
            serde_json::to_value(stored).unwrap(),
            json!({"i": "w1", "x": 0, "y": 0, "w": 3, "h": 4, "minW": 2, "minH": 2})
        );
    }

    #[tokio::test]
    async fn test_missing_reads_are_absent_and_mutations_not_found() {
        let repo = spawn_backend().await;
        let missing = DashboardId::new("missing");
        assert!(repo.get_dashboard(&missing).await.unwrap().is_none());
        assert!(repo.get_layout(&missing).await.unwrap().is_none());
        assert!(repo.get_widget(&"missing".into()).await.unwrap().is_none());
        assert!(repo.delete_dashboard(&missing).await.unwrap_err().is_not_found());
        assert!(repo.delete_widget(&"missing".into()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_dashboard_crud() {
        let repo = spawn_backend().await;
        let created = repo
            .create_dashboard(CreateDashboard::new("Recruiting").with_description("Pipeline"))
            .await
            .unwrap();
        assert_eq!(repo.list_dashboards().await.unwrap().len(), 2);

        let layout = repo.get_layout(&created.id).await.unwrap().unwrap();
        assert_eq!(layout.layouts, GridLayout::blank());

        let renamed = repo
            .update_dashboard(
                &created.id,
                UpdateDashboard {
                    name: Some("Hiring".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Hiring");
        assert_eq!(renamed.description.as_deref(), Some("Pipeline"));

        repo.delete_dashboard(&created.id).await.unwrap();
        assert!(repo.get_dashboard(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_widget_crud_and_filtering() {
        let repo = spawn_backend().await;
        assert_eq!(repo.list_widgets(Some(&dashboard())).await.unwrap().len(), 3);
        assert!(repo.list_widgets(Some(&"other".into())).await.unwrap().is_empty());

        let config = serde_json::from_value(json!({"type": "kpi", "title": "Offers", "valueKey": "offers"}))
            .unwrap();
        let widget = repo
            .create_widget(CreateWidget {
                dashboard_id: dashboard(),
                config,
            })
            .await
            .unwrap();

        let patch = json!({"format": "percent"});
        let updated = repo
            .update_widget(&widget.id, patch.as_object().unwrap().clone())
            .await
            .unwrap();
        assert_eq!(updated.config.title(), "Offers");
        assert_eq!(serde_json::to_value(&updated.config).unwrap()["format"], "percent");

        repo.delete_widget(&widget.id).await.unwrap();
        assert_eq!(repo.list_widgets(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_server_side_rejection_is_reported() {
        let repo = spawn_backend().await;
        let bad = json!({"title": ""});
        let err = repo
            .update_widget(&"widget-kpi-1".into(), bad.as_object().unwrap().clone())
            .await
            .unwrap_err();
        match err {
            DashboardError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("title"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_collection_endpoint_is_a_rejection() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, axum::Router::new()).await.unwrap();
        });
        let repo = HttpDashboardRepository::new(format!("http://{}/api/v1", addr));

        for err in [
            repo.list_dashboards().await.unwrap_err(),
            repo.list_widgets(Some(&dashboard())).await.unwrap_err(),
        ] {
            match err {
                DashboardError::Rejected { status, message } => {
                    assert_eq!(status, 404);
                    assert_eq!(message, "404 Not Found");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}
