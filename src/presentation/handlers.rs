// HTTP request handlers
use crate::application::error::DashboardError;
use crate::domain::dashboard::{CreateDashboard, Dashboard, UpdateDashboard};
use crate::domain::ids::{DashboardId, WidgetId};
use crate::domain::layout::{DashboardLayout, GridLayout};
use crate::domain::widget::{CreateWidget, WidgetInstance};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Maps application errors onto status codes with an `{error}` body.
#[derive(Debug)]
pub struct ApiError(DashboardError);

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(DashboardError::Rejected {
            status: StatusCode::BAD_REQUEST.as_u16(),
            message: rejection.body_text(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DashboardError::NotFound { .. } => StatusCode::NOT_FOUND,
            DashboardError::Invalid(_) | DashboardError::Decode(_) => StatusCode::BAD_REQUEST,
            DashboardError::Rejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            DashboardError::Transport(_) => StatusCode::BAD_GATEWAY,
        };
        let message = match self.0 {
            DashboardError::Rejected { message, .. } => message,
            other => other.to_string(),
        };
        if status.is_client_error() {
            tracing::warn!("Rejected request ({}): {}", status, message);
        } else {
            tracing::error!("Request failed ({}): {}", status, message);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn found<T>(value: Option<T>, entity: &'static str, id: impl ToString) -> ApiResult<Json<T>> {
    value
        .map(Json)
        .ok_or_else(|| DashboardError::not_found(entity, id).into())
}

#[derive(Serialize)]
pub struct DashboardList {
    pub dashboards: Vec<Dashboard>,
}

#[derive(Serialize)]
pub struct WidgetList {
    pub widgets: Vec<WidgetInstance>,
}

#[derive(Deserialize)]
pub struct LayoutBody {
    pub layouts: GridLayout,
}

#[derive(Deserialize)]
pub struct WidgetPatch {
    pub config: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetFilter {
    pub dashboard_id: Option<DashboardId>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> ApiResult<Json<DashboardList>> {
    let dashboards = state.repository.list_dashboards().await?;
    Ok(Json(DashboardList { dashboards }))
}

pub async fn get_dashboard(
    Path(id): Path<DashboardId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Dashboard>> {
    found(state.repository.get_dashboard(&id).await?, "dashboard", id)
}

pub async fn get_layout(
    Path(id): Path<DashboardId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DashboardLayout>> {
    found(state.repository.get_layout(&id).await?, "layout", id)
}

pub async fn create_dashboard(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateDashboard>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Dashboard>)> {
    let Json(input) = payload?;
    let dashboard = state.repository.create_dashboard(input).await?;
    tracing::info!("Created dashboard {}", dashboard.id);
    Ok((StatusCode::CREATED, Json(dashboard)))
}

pub async fn update_dashboard(
    Path(id): Path<DashboardId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateDashboard>, JsonRejection>,
) -> ApiResult<Json<Dashboard>> {
    let Json(input) = payload?;
    Ok(Json(state.repository.update_dashboard(&id, input).await?))
}

pub async fn update_layout(
    Path(id): Path<DashboardId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LayoutBody>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = payload?;
    state.repository.update_layout(&id, &body.layouts).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_dashboard(
    Path(id): Path<DashboardId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.repository.delete_dashboard(&id).await?;
    tracing::info!("Deleted dashboard {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_widgets(
    Query(filter): Query<WidgetFilter>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<WidgetList>> {
    let widgets = state
        .repository
        .list_widgets(filter.dashboard_id.as_ref())
        .await?;
    Ok(Json(WidgetList { widgets }))
}

pub async fn list_dashboard_widgets(
    Path(id): Path<DashboardId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<WidgetList>> {
    let widgets = state.repository.list_widgets(Some(&id)).await?;
    Ok(Json(WidgetList { widgets }))
}

pub async fn get_widget(
    Path(id): Path<WidgetId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<WidgetInstance>> {
    found(state.repository.get_widget(&id).await?, "widget", id)
}

pub async fn create_widget(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateWidget>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<WidgetInstance>)> {
    let Json(input) = payload?;
    let widget = state.repository.create_widget(input).await?;
    tracing::info!("Created widget {} on dashboard {}", widget.id, widget.dashboard_id);
    Ok((StatusCode::CREATED, Json(widget)))
}

pub async fn update_widget(
    Path(id): Path<WidgetId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WidgetPatch>, JsonRejection>,
) -> ApiResult<Json<WidgetInstance>> {
    let Json(patch) = payload?;
    Ok(Json(state.repository.update_widget(&id, patch.config).await?))
}

pub async fn delete_widget(
    Path(id): Path<WidgetId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.repository.delete_widget(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
