// Repository trait for dashboard, layout and widget persistence
use crate::application::error::Result;
use crate::domain::dashboard::{CreateDashboard, Dashboard, UpdateDashboard};
use crate::domain::ids::{DashboardId, WidgetId};
use crate::domain::layout::{DashboardLayout, GridLayout};
use crate::domain::widget::{CreateWidget, WidgetInstance};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Backend CRUD surface. Reads return `Ok(None)` when the entity does not
/// exist; mutations on a missing entity return `DashboardError::NotFound`.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>>;

    async fn get_dashboard(&self, id: &DashboardId) -> Result<Option<Dashboard>>;

    async fn get_layout(&self, id: &DashboardId) -> Result<Option<DashboardLayout>>;

    async fn create_dashboard(&self, input: CreateDashboard) -> Result<Dashboard>;

    async fn update_dashboard(&self, id: &DashboardId, input: UpdateDashboard) -> Result<Dashboard>;

    /// Replace the per-breakpoint geometry of a dashboard.
    async fn update_layout(&self, id: &DashboardId, layouts: &GridLayout) -> Result<()>;

    /// Delete a dashboard together with its layout and widgets.
    async fn delete_dashboard(&self, id: &DashboardId) -> Result<()>;

    /// All widgets, or only those owned by `dashboard_id`.
    async fn list_widgets(&self, dashboard_id: Option<&DashboardId>) -> Result<Vec<WidgetInstance>>;

    async fn get_widget(&self, id: &WidgetId) -> Result<Option<WidgetInstance>>;

    async fn create_widget(&self, input: CreateWidget) -> Result<WidgetInstance>;

    /// Shallow-merge `config` keys over the stored configuration.
    async fn update_widget(&self, id: &WidgetId, config: Map<String, Value>) -> Result<WidgetInstance>;

    async fn delete_widget(&self, id: &WidgetId) -> Result<()>;
}
