// Widget domain model - instances and their typed configuration
use super::ids::{DashboardId, DatasetId, WidgetId, WorkspaceId};
use super::validation::{check_length, check_optional_length, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TITLE_MAX: usize = 100;
pub const SUBTITLE_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetInstance {
    pub id: WidgetId,
    pub dashboard_id: DashboardId,
    pub config: WidgetConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WidgetInstance {
    pub fn new(id: WidgetId, dashboard_id: DashboardId, config: WidgetConfig) -> Self {
        let now = Utc::now();
        Self {
            id,
            dashboard_id,
            config,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWidget {
    pub dashboard_id: DashboardId,
    pub config: WidgetConfig,
}

impl CreateWidget {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.config.validate()
    }
}

/// Rendering parameters, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WidgetConfig {
    Kpi(KpiConfig),
    BarChart(BarChartConfig),
    LineChart(LineChartConfig),
    AreaChart(AreaChartConfig),
    ComposedChart(ComposedChartConfig),
    VegaChart(VegaChartConfig),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Kpi,
    BarChart,
    LineChart,
    AreaChart,
    ComposedChart,
    VegaChart,
}

impl WidgetConfig {
    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetConfig::Kpi(_) => WidgetKind::Kpi,
            WidgetConfig::BarChart(_) => WidgetKind::BarChart,
            WidgetConfig::LineChart(_) => WidgetKind::LineChart,
            WidgetConfig::AreaChart(_) => WidgetKind::AreaChart,
            WidgetConfig::ComposedChart(_) => WidgetKind::ComposedChart,
            WidgetConfig::VegaChart(_) => WidgetKind::VegaChart,
        }
    }

    pub fn base(&self) -> &BaseConfig {
        match self {
            WidgetConfig::Kpi(c) => &c.base,
            WidgetConfig::BarChart(c) => &c.base,
            WidgetConfig::LineChart(c) => &c.base,
            WidgetConfig::AreaChart(c) => &c.base,
            WidgetConfig::ComposedChart(c) => &c.base,
            WidgetConfig::VegaChart(c) => &c.base,
        }
    }

    pub fn title(&self) -> &str {
        &self.base().title
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.base().validate()?;
        if let WidgetConfig::AreaChart(area) = self {
            for series in &area.series {
                if let Some(opacity) = series.fill_opacity {
                    if !(0.0..=1.0).contains(&opacity) {
                        return Err(ValidationError::new(
                            "series.fillOpacity",
                            "must be between 0 and 1",
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Shallow-merge `patch` over this config. The result must still be a
    /// valid variant or the patch is rejected.
    pub fn merged(&self, patch: &Map<String, Value>) -> Result<WidgetConfig, ValidationError> {
        let mut current = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => return Err(ValidationError::new("config", "not an object")),
        };
        for (key, value) in patch {
            current.insert(key.clone(), value.clone());
        }
        let merged: WidgetConfig = serde_json::from_value(Value::Object(current))
            .map_err(|e| ValidationError::new("config", e.to_string()))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseConfig {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSourceConfig>,
}

impl BaseConfig {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            data_source: None,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_length("title", &self.title, 1, TITLE_MAX)?;
        check_optional_length("subtitle", self.subtitle.as_deref(), SUBTITLE_MAX)?;
        if let Some(source) = &self.data_source {
            source.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiFormat {
    Number,
    Currency,
    Percent,
    Score,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub value_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<KpiFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisBound {
    Value(f64),
    Keyword(AutoBound),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoBound {
    #[serde(rename = "auto")]
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisConfig {
    pub data_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<[AxisBound; 2]>,
}

impl AxisConfig {
    pub fn keyed(data_key: impl Into<String>) -> Self {
        Self {
            data_key: data_key.into(),
            label: None,
            hide: None,
            domain: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceLine {
    Value(f64),
    Keyword(AverageLine),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AverageLine {
    #[serde(rename = "average")]
    Average,
}

/// Toggles shared by the cartesian chart variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartChrome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_grid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_tooltip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_legend: Option<bool>,
}

impl ChartChrome {
    pub fn grid(&self) -> bool {
        self.show_grid.unwrap_or(true)
    }

    pub fn tooltip(&self) -> bool {
        self.show_tooltip.unwrap_or(true)
    }

    pub fn legend(&self) -> bool {
        self.show_legend.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChartConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub x_axis: AxisConfig,
    pub y_axis: AxisConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(flatten)]
    pub chrome: ChartChrome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_reference_line: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_line_value: Option<ReferenceLine>,
}

impl BarChartConfig {
    pub fn orientation(&self) -> Orientation {
        self.orientation.unwrap_or(Orientation::Vertical)
    }

    pub fn colors(&self) -> Vec<String> {
        self.colors
            .clone()
            .unwrap_or_else(|| vec!["#0078d4".to_string()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CurveType {
    Monotone,
    Linear,
    Step,
    StepBefore,
    StepAfter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesConfig {
    pub data_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dot_radius: Option<f64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<CurveType>,
}

impl SeriesConfig {
    pub fn keyed(data_key: impl Into<String>) -> Self {
        Self {
            data_key: data_key.into(),
            name: None,
            color: None,
            stroke_width: None,
            stroke_dasharray: None,
            dot_radius: None,
            curve: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChartConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub x_axis: AxisConfig,
    pub series: Vec<SeriesConfig>,
    #[serde(flatten)]
    pub chrome: ChartChrome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSeriesConfig {
    #[serde(flatten)]
    pub series: SeriesConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaChartConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub x_axis: AxisConfig,
    pub series: Vec<AreaSeriesConfig>,
    #[serde(flatten)]
    pub chrome: ChartChrome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Bar,
    Line,
    Area,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartElement {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub data_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_type: Option<CurveType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedChartConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub x_axis: AxisConfig,
    pub y_axis: AxisConfig,
    pub elements: Vec<ChartElement>,
    #[serde(flatten)]
    pub chrome: ChartChrome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VegaChartConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    /// Vega-Lite specification, passed through untouched.
    pub spec: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceConfig {
    pub workspace_id: WorkspaceId,
    pub dataset_id: DatasetId,
    pub query: DataQuery,
    /// Seconds between refreshes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<u32>,
}

impl DataSourceConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.refresh_interval == Some(0) {
            return Err(ValidationError::new(
                "dataSource.refreshInterval",
                "must be positive",
            ));
        }
        if let DataQuery::Structured(query) = &self.query {
            if query.limit == Some(0) {
                return Err(ValidationError::new("dataSource.query.limit", "must be positive"));
            }
        }
        Ok(())
    }
}

/// Either an opaque query-language expression or a structured query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataQuery {
    Text(String),
    Structured(QueryObject),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryObject {
    pub table: String,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<QueryFilter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<OrderByClause>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByClause {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}
