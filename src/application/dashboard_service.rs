// Dashboard service - Cached data access with invalidation on every mutation
use crate::application::error::Result;
use crate::application::query_cache::{CachedValue, QueryCache, QueryKey};
use crate::application::repository::DashboardRepository;
use crate::domain::dashboard::{CreateDashboard, Dashboard, UpdateDashboard};
use crate::domain::ids::{DashboardId, WidgetId};
use crate::domain::layout::{DashboardLayout, GridLayout};
use crate::domain::widget::{CreateWidget, WidgetInstance};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Front door for reads and writes. Reads go through the [`QueryCache`];
/// writes validate locally, reach the backend, then invalidate the entries
/// they affect. Nothing is merged optimistically here.
///
/// Implements [`DashboardRepository`] itself so the layout persistence
/// pipeline can write through it and keep the layout entry honest.
#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn DashboardRepository>,
    cache: Arc<QueryCache>,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn DashboardRepository>, cache: Arc<QueryCache>) -> Self {
        Self { repository, cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn invalidate_widget_owner(&self, dashboard_id: &DashboardId) {
        self.cache
            .invalidate(&QueryKey::WidgetsByDashboard(dashboard_id.clone()));
        self.cache.invalidate(&QueryKey::WidgetList);
        self.cache
            .invalidate(&QueryKey::DashboardLayout(dashboard_id.clone()));
    }

    async fn widget_owner(&self, id: &WidgetId) -> Result<Option<DashboardId>> {
        if let Some(CachedValue::Widget(widget)) = self.cache.get_fresh(&QueryKey::WidgetDetail(id.clone())) {
            return Ok(Some(widget.dashboard_id));
        }
        Ok(self.repository.get_widget(id).await?.map(|w| w.dashboard_id))
    }
}

#[async_trait]
impl DashboardRepository for DashboardService {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>> {
        let key = QueryKey::DashboardList;
        if let Some(CachedValue::Dashboards(dashboards)) = self.cache.get_fresh(&key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(dashboards);
        }
        let ticket = self.cache.ticket(&key);
        let dashboards = self.repository.list_dashboards().await?;
        self.cache
            .insert_if_current(key, ticket, CachedValue::Dashboards(dashboards.clone()));
        Ok(dashboards)
    }

    async fn get_dashboard(&self, id: &DashboardId) -> Result<Option<Dashboard>> {
        let key = QueryKey::DashboardDetail(id.clone());
        if let Some(CachedValue::Dashboard(dashboard)) = self.cache.get_fresh(&key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(Some(dashboard));
        }
        let ticket = self.cache.ticket(&key);
        let dashboard = self.repository.get_dashboard(id).await?;
        if let Some(found) = &dashboard {
            self.cache
                .insert_if_current(key, ticket, CachedValue::Dashboard(found.clone()));
        }
        Ok(dashboard)
    }

    async fn get_layout(&self, id: &DashboardId) -> Result<Option<DashboardLayout>> {
        let key = QueryKey::DashboardLayout(id.clone());
        if let Some(CachedValue::Layout(layout)) = self.cache.get_fresh(&key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(Some(layout));
        }
        let ticket = self.cache.ticket(&key);
        let layout = self.repository.get_layout(id).await?;
        if let Some(found) = &layout {
            self.cache
                .insert_if_current(key, ticket, CachedValue::Layout(found.clone()));
        }
        Ok(layout)
    }

    async fn create_dashboard(&self, input: CreateDashboard) -> Result<Dashboard> {
        input.validate()?;
        let dashboard = self.repository.create_dashboard(input).await?;
        self.cache.invalidate(&QueryKey::DashboardList);
        Ok(dashboard)
    }

    async fn update_dashboard(&self, id: &DashboardId, input: UpdateDashboard) -> Result<Dashboard> {
        input.validate()?;
        let dashboard = self.repository.update_dashboard(id, input).await?;
        self.cache.invalidate(&QueryKey::DashboardList);
        self.cache.invalidate(&QueryKey::DashboardDetail(id.clone()));
        self.cache.invalidate(&QueryKey::DashboardLayout(id.clone()));
        Ok(dashboard)
    }

    async fn update_layout(&self, id: &DashboardId, layouts: &GridLayout) -> Result<()> {
        layouts.validate()?;
        self.repository.update_layout(id, layouts).await?;
        self.cache.invalidate(&QueryKey::DashboardLayout(id.clone()));
        Ok(())
    }

    async fn delete_dashboard(&self, id: &DashboardId) -> Result<()> {
        self.repository.delete_dashboard(id).await?;
        self.cache.invalidate(&QueryKey::DashboardList);
        self.cache.remove(&QueryKey::DashboardDetail(id.clone()));
        self.cache.remove(&QueryKey::DashboardLayout(id.clone()));
        self.cache.remove(&QueryKey::WidgetsByDashboard(id.clone()));
        self.cache.invalidate(&QueryKey::WidgetList);
        Ok(())
    }

    async fn list_widgets(&self, dashboard_id: Option<&DashboardId>) -> Result<Vec<WidgetInstance>> {
        let key = match dashboard_id {
            Some(id) => QueryKey::WidgetsByDashboard(id.clone()),
            None => QueryKey::WidgetList,
        };
        if let Some(CachedValue::Widgets(widgets)) = self.cache.get_fresh(&key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(widgets);
        }
        let ticket = self.cache.ticket(&key);
        let widgets = self.repository.list_widgets(dashboard_id).await?;
        self.cache
            .insert_if_current(key, ticket, CachedValue::Widgets(widgets.clone()));
        Ok(widgets)
    }

    async fn get_widget(&self, id: &WidgetId) -> Result<Option<WidgetInstance>> {
        let key = QueryKey::WidgetDetail(id.clone());
        if let Some(CachedValue::Widget(widget)) = self.cache.get_fresh(&key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(Some(widget));
        }
        let ticket = self.cache.ticket(&key);
        let widget = self.repository.get_widget(id).await?;
        if let Some(found) = &widget {
            self.cache
                .insert_if_current(key, ticket, CachedValue::Widget(found.clone()));
        }
        Ok(widget)
    }

    async fn create_widget(&self, input: CreateWidget) -> Result<WidgetInstance> {
        input.validate()?;
        let widget = self.repository.create_widget(input).await?;
        self.cache.invalidate(&QueryKey::WidgetDetail(widget.id.clone()));
        self.invalidate_widget_owner(&widget.dashboard_id);
        Ok(widget)
    }

    async fn update_widget(&self, id: &WidgetId, config: Map<String, Value>) -> Result<WidgetInstance> {
        let widget = self.repository.update_widget(id, config).await?;
        self.cache.invalidate(&QueryKey::WidgetDetail(id.clone()));
        self.invalidate_widget_owner(&widget.dashboard_id);
        Ok(widget)
    }

    async fn delete_widget(&self, id: &WidgetId) -> Result<()> {
        let owner = self.widget_owner(id).await?;
        self.repository.delete_widget(id).await?;
        self.cache.remove(&QueryKey::WidgetDetail(id.clone()));
        match owner {
            Some(dashboard_id) => self.invalidate_widget_owner(&dashboard_id),
            None => self.cache.invalidate(&QueryKey::WidgetList),
        }
        Ok(())
    }
}
