// In-memory repository - Backing store for the standalone backend and tests
use crate::application::error::{DashboardError, Result};
use crate::application::repository::DashboardRepository;
use crate::domain::dashboard::{CreateDashboard, Dashboard, UpdateDashboard};
use crate::domain::ids::{generate_id, DashboardId, WidgetId};
use crate::domain::layout::{Breakpoint, DashboardLayout, GridLayout, GridPlacement};
use crate::domain::widget::{
    AxisConfig, BarChartConfig, BaseConfig, ChartChrome, CreateWidget, KpiConfig, KpiFormat,
    LineChartConfig, SeriesConfig, WidgetConfig, WidgetInstance,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct BackendState {
    dashboards: Vec<Dashboard>,
    layouts: HashMap<DashboardId, DashboardLayout>,
    widgets: Vec<WidgetInstance>,
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<BackendState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository holding one sample dashboard with a KPI card and two
    /// charts laid out for the `lg` and `md` tiers.
    pub fn with_demo_data() -> Self {
        let repository = Self::new();
        {
            let mut state = repository.write();
            let dashboard_id = DashboardId::new("dashboard-1");
            state.dashboards.push(Dashboard::new(
                dashboard_id.clone(),
                "Executive Overview".to_string(),
                Some("High-level KPIs and trends".to_string()),
            ));

            let widgets = vec![
                WidgetInstance::new(
                    "widget-kpi-1".into(),
                    dashboard_id.clone(),
                    WidgetConfig::Kpi(KpiConfig {
                        base: BaseConfig::titled("Headcount"),
                        value_key: "headcount".to_string(),
                        previous_value_key: Some("previousHeadcount".to_string()),
                        change_key: None,
                        format: Some(KpiFormat::Number),
                        icon: None,
                        color: None,
                        trend_label: Some("vs last month".to_string()),
                    }),
                ),
                WidgetInstance::new(
                    "widget-bar-1".into(),
                    dashboard_id.clone(),
                    WidgetConfig::BarChart(BarChartConfig {
                        base: BaseConfig::titled("Hires by Department"),
                        x_axis: AxisConfig::keyed("department"),
                        y_axis: AxisConfig::keyed("hires"),
                        orientation: None,
                        stacked: None,
                        colors: None,
                        chrome: ChartChrome::default(),
                        show_reference_line: None,
                        reference_line_value: None,
                    }),
                ),
                WidgetInstance::new(
                    "widget-line-1".into(),
                    dashboard_id.clone(),
                    WidgetConfig::LineChart(LineChartConfig {
                        base: BaseConfig::titled("Attrition Trend"),
                        x_axis: AxisConfig::keyed("month"),
                        series: vec![SeriesConfig::keyed("attrition")],
                        chrome: ChartChrome::default(),
                    }),
                ),
            ];

            let lg = vec![
                GridPlacement::new(0, 0, 3, 2).with_min(2, 1).at("widget-kpi-1".into()),
                GridPlacement::new(0, 2, 6, 4).with_min(2, 2).at("widget-bar-1".into()),
                GridPlacement::new(6, 2, 6, 4).with_min(2, 2).at("widget-line-1".into()),
            ];
            let md = vec![
                GridPlacement::new(0, 0, 5, 2).with_min(2, 2).at("widget-kpi-1".into()),
                GridPlacement::new(0, 2, 5, 4).with_min(2, 3).at("widget-bar-1".into()),
                GridPlacement::new(5, 2, 5, 4).with_min(2, 3).at("widget-line-1".into()),
            ];
            let mut layout = DashboardLayout::new(
                dashboard_id.clone(),
                GridLayout::new()
                    .with_breakpoint(Breakpoint::Lg, lg)
                    .with_breakpoint(Breakpoint::Md, md),
            );
            layout.widgets = widgets.iter().map(|w| w.id.clone()).collect();

            state.layouts.insert(dashboard_id, layout);
            state.widgets = widgets;
        }
        repository
    }

    fn read(&self) -> RwLockReadGuard<'_, BackendState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BackendState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DashboardRepository for InMemoryRepository {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>> {
        Ok(self.read().dashboards.clone())
    }

    async fn get_dashboard(&self, id: &DashboardId) -> Result<Option<Dashboard>> {
        Ok(self.read().dashboards.iter().find(|d| &d.id == id).cloned())
    }

    async fn get_layout(&self, id: &DashboardId) -> Result<Option<DashboardLayout>> {
        Ok(self.read().layouts.get(id).cloned())
    }

    async fn create_dashboard(&self, input: CreateDashboard) -> Result<Dashboard> {
        input.validate()?;
        let id = DashboardId::new(generate_id("dashboard"));
        let dashboard = Dashboard::new(id.clone(), input.name, input.description);

        let mut state = self.write();
        state.dashboards.push(dashboard.clone());
        state
            .layouts
            .insert(id.clone(), DashboardLayout::new(id, GridLayout::blank()));
        Ok(dashboard)
    }

    async fn update_dashboard(&self, id: &DashboardId, input: UpdateDashboard) -> Result<Dashboard> {
        input.validate()?;
        let mut state = self.write();
        let dashboard = state
            .dashboards
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| DashboardError::not_found("dashboard", id))?;
        dashboard.apply(input);
        Ok(dashboard.clone())
    }

    async fn update_layout(&self, id: &DashboardId, layouts: &GridLayout) -> Result<()> {
        layouts.validate()?;
        let mut state = self.write();
        match state.layouts.get_mut(id) {
            Some(layout) => layout.layouts = layouts.clone(),
            None => tracing::debug!("Ignoring layout write for unknown dashboard {}", id),
        }
        Ok(())
    }

    async fn delete_dashboard(&self, id: &DashboardId) -> Result<()> {
        let mut state = self.write();
        let before = state.dashboards.len();
        state.dashboards.retain(|d| &d.id != id);
        if state.dashboards.len() == before {
            return Err(DashboardError::not_found("dashboard", id));
        }
        state.layouts.remove(id);
        state.widgets.retain(|w| &w.dashboard_id != id);
        Ok(())
    }

    async fn list_widgets(&self, dashboard_id: Option<&DashboardId>) -> Result<Vec<WidgetInstance>> {
        let state = self.read();
        Ok(state
            .widgets
            .iter()
            .filter(|w| dashboard_id.is_none_or(|id| &w.dashboard_id == id))
            .cloned()
            .collect())
    }

    async fn get_widget(&self, id: &WidgetId) -> Result<Option<WidgetInstance>> {
        Ok(self.read().widgets.iter().find(|w| &w.id == id).cloned())
    }

    async fn create_widget(&self, input: CreateWidget) -> Result<WidgetInstance> {
        input.validate()?;
        let mut state = self.write();
        if !state.dashboards.iter().any(|d| d.id == input.dashboard_id) {
            return Err(DashboardError::not_found("dashboard", &input.dashboard_id));
        }
        let widget = WidgetInstance::new(
            WidgetId::new(generate_id("widget")),
            input.dashboard_id,
            input.config,
        );
        if let Some(layout) = state.layouts.get_mut(&widget.dashboard_id) {
            layout.widgets.push(widget.id.clone());
        }
        state.widgets.push(widget.clone());
        Ok(widget)
    }

    async fn update_widget(&self, id: &WidgetId, config: Map<String, Value>) -> Result<WidgetInstance> {
        let mut state = self.write();
        let widget = state
            .widgets
            .iter_mut()
            .find(|w| &w.id == id)
            .ok_or_else(|| DashboardError::not_found("widget", id))?;
        widget.config = widget.config.merged(&config)?;
        widget.updated_at = Utc::now();
        Ok(widget.clone())
    }

    async fn delete_widget(&self, id: &WidgetId) -> Result<()> {
        let mut state = self.write();
        let position = state
            .widgets
            .iter()
            .position(|w| &w.id == id)
            .ok_or_else(|| DashboardError::not_found("widget", id))?;
        let widget = state.widgets.remove(position);
        if let Some(layout) = state.layouts.get_mut(&widget.dashboard_id) {
            layout.widgets.retain(|w| w != id);
        }
        Ok(())
    }
}
