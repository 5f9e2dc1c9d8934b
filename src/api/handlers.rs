//! API request handlers
//!
//! Every handler locks the shared dashboard, applies one event, and answers
//! from the view recomputed by that event.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::server::AppState;
use crate::core::{ChartPayload, Dashboard, DashboardState};
use crate::error::{DashError, InsightError};
use crate::excel::SheetReader;
use crate::insight::{InsightReply, InsightRequest};
use crate::types::{
    AxisSelection, CellValue, ChartKind, FilterPredicate, FilterSpec, MetricsResult, SnapshotId,
};

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

pub type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn ok<T: Serialize>(data: T) -> Reply<T> {
    (StatusCode::OK, Json(ApiResponse::ok(data)))
}

fn fail<T: Serialize>(err: &DashError) -> Reply<T> {
    (status_for(err), Json(ApiResponse::err(err.to_string())))
}

/// HTTP status for each error kind
pub fn status_for(err: &DashError) -> StatusCode {
    match err {
        DashError::Load(_) | DashError::Axis(_) | DashError::Validation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        DashError::Insight(InsightError::Stale { .. }) | DashError::NoData => StatusCode::CONFLICT,
        DashError::Insight(InsightError::Client(_)) => StatusCode::BAD_GATEWAY,
        DashError::Insight(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DashError::ColumnNotFound(_) => StatusCode::NOT_FOUND,
        DashError::Import(_) | DashError::Json(_) => StatusCode::BAD_REQUEST,
        DashError::Io(_) | DashError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(method: &str, path: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Survey Dash API Server".to_string(),
        version: state.version.clone(),
        description: "Upload survey spreadsheets, filter rows, chart axes and statistics"
            .to_string(),
        endpoints: vec![
            endpoint("GET", "/health", "Health check endpoint"),
            endpoint("GET", "/version", "Get server version"),
            endpoint("POST", "/api/v1/upload", "Load a raw matrix or spreadsheet file"),
            endpoint("GET", "/api/v1/dashboard", "Full derived dashboard state"),
            endpoint("POST", "/api/v1/axes", "Change category and numeric axes"),
            endpoint("POST", "/api/v1/filters", "Set one column's filter predicate"),
            endpoint("POST", "/api/v1/filters/clear", "Reset every filter"),
            endpoint("POST", "/api/v1/chart-kind", "Select the chart type"),
            endpoint("GET", "/api/v1/chart", "Chart-ready rows"),
            endpoint("GET", "/api/v1/metrics", "Per-column statistics"),
            endpoint("POST", "/api/v1/insight/request", "Build an AI query payload"),
            endpoint("POST", "/api/v1/insight/reply", "Submit an AI reply"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_message: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub chart_kinds: Vec<ChartKind>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        chart_kinds: ChartKind::ALL.to_vec(),
    }))
}

//==============================================================================
// Dashboard views
//==============================================================================

/// Full dashboard state
#[derive(Serialize, Debug)]
pub struct DashboardResponse {
    pub state: String,
    pub snapshot: SnapshotId,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub axes: Option<AxisSelection>,
    pub filters: Option<FilterSpec>,
    pub chart: ChartPayload,
    /// Rounded to 2 decimals for display
    pub metrics: MetricsResult,
    pub insight: Option<String>,
}

impl DashboardResponse {
    pub fn from_dashboard(dashboard: &Dashboard) -> Self {
        let sheet = dashboard.spreadsheet();
        Self {
            state: match dashboard.state() {
                DashboardState::NoData => "no_data".to_string(),
                DashboardState::DataLoaded => "data_loaded".to_string(),
            },
            snapshot: dashboard.snapshot(),
            columns: sheet.map(|s| s.header().to_vec()).unwrap_or_default(),
            row_count: sheet.map(|s| s.row_count()).unwrap_or(0),
            axes: dashboard.axes().cloned(),
            filters: dashboard.filters().cloned(),
            chart: ChartPayload::from_dashboard(dashboard),
            metrics: dashboard.metrics().rounded(),
            insight: dashboard.insight().map(str::to_string),
        }
    }
}

/// GET /api/v1/dashboard
pub async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dashboard = state.dashboard.lock().await;
    ok(DashboardResponse::from_dashboard(&dashboard))
}

/// GET /api/v1/chart
pub async fn chart(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dashboard = state.dashboard.lock().await;
    ok(ChartPayload::from_dashboard(&dashboard))
}

/// Metrics response
#[derive(Serialize, Debug)]
pub struct MetricsResponse {
    pub snapshot: SnapshotId,
    pub columns: Vec<String>,
    pub metrics: MetricsResult,
}

/// GET /api/v1/metrics - rounded statistics in numeric axis order
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dashboard = state.dashboard.lock().await;
    ok(MetricsResponse {
        snapshot: dashboard.snapshot(),
        columns: dashboard
            .axes()
            .map(|a| a.numeric.clone())
            .unwrap_or_default(),
        metrics: dashboard.metrics().rounded(),
    })
}

//==============================================================================
// Events
//==============================================================================

/// Upload request: either an inline matrix or a path the server can read
#[derive(Deserialize, Debug, Default)]
pub struct UploadRequest {
    #[serde(default)]
    pub data: Option<Vec<Vec<CellValue>>>,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// POST /api/v1/upload
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadRequest>,
) -> Reply<DashboardResponse> {
    let raw = match (req.data, req.file_path) {
        (Some(data), _) => data,
        (None, Some(path)) => match SheetReader::new(&path).read() {
            Ok(data) => data,
            Err(e) => return fail(&e),
        },
        (None, None) => {
            return fail(&DashError::Validation(
                "Provide either 'data' or 'file_path'".to_string(),
            ))
        }
    };

    let mut dashboard = state.dashboard.lock().await;
    match dashboard.load(raw) {
        Ok(()) => ok(DashboardResponse::from_dashboard(&dashboard)),
        Err(e) => fail(&DashError::Load(e)),
    }
}

/// Axis change; omitted fields keep their current value
#[derive(Deserialize, Debug, Default)]
pub struct AxesRequest {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub numeric: Option<Vec<String>>,
}

/// POST /api/v1/axes
pub async fn set_axes(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AxesRequest>,
) -> Reply<ChartPayload> {
    let mut dashboard = state.dashboard.lock().await;
    let Some(current) = dashboard.axes().cloned() else {
        return fail(&DashError::NoData);
    };
    let axes = AxisSelection {
        category: req.category.unwrap_or(current.category),
        numeric: req.numeric.unwrap_or(current.numeric),
    };
    match dashboard.set_axes(axes) {
        Ok(()) => ok(ChartPayload::from_dashboard(&dashboard)),
        Err(e) => fail(&e),
    }
}

/// Filter change for one column
#[derive(Deserialize, Debug)]
pub struct FilterRequest {
    pub column: String,
    pub predicate: FilterPredicate,
}

/// POST /api/v1/filters
pub async fn set_filter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilterRequest>,
) -> Reply<ChartPayload> {
    let mut dashboard = state.dashboard.lock().await;
    match dashboard.set_filter(&req.column, req.predicate) {
        Ok(()) => ok(ChartPayload::from_dashboard(&dashboard)),
        Err(e) => fail(&e),
    }
}

/// POST /api/v1/filters/clear
pub async fn clear_filters(State(state): State<Arc<AppState>>) -> Reply<ChartPayload> {
    let mut dashboard = state.dashboard.lock().await;
    match dashboard.clear_filters() {
        Ok(()) => ok(ChartPayload::from_dashboard(&dashboard)),
        Err(e) => fail(&e),
    }
}

#[derive(Deserialize, Debug)]
pub struct ChartKindRequest {
    pub kind: ChartKind,
}

/// POST /api/v1/chart-kind
pub async fn set_chart_kind(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChartKindRequest>,
) -> impl IntoResponse {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.set_chart_kind(req.kind);
    ok(ChartPayload::from_dashboard(&dashboard))
}

//==============================================================================
// AI query collaborator
//==============================================================================

#[derive(Deserialize, Debug)]
pub struct InsightQueryRequest {
    pub query: String,
}

/// Tagged request plus the rendered prompt
#[derive(Serialize, Debug)]
pub struct InsightRequestResponse {
    pub request: InsightRequest,
    pub prompt: String,
}

/// POST /api/v1/insight/request
pub async fn insight_request(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InsightQueryRequest>,
) -> Reply<InsightRequestResponse> {
    let dashboard = state.dashboard.lock().await;
    let built = dashboard
        .insight_request(&req.query)
        .and_then(|request| request.prompt().map(|prompt| (request, prompt)));
    match built {
        Ok((request, prompt)) => ok(InsightRequestResponse { request, prompt }),
        Err(e) => fail(&e),
    }
}

#[derive(Serialize, Debug)]
pub struct InsightAcceptedResponse {
    pub accepted: bool,
    pub snapshot: SnapshotId,
}

/// POST /api/v1/insight/reply
pub async fn insight_reply(
    State(state): State<Arc<AppState>>,
    Json(reply): Json<InsightReply>,
) -> Reply<InsightAcceptedResponse> {
    let mut dashboard = state.dashboard.lock().await;
    let snapshot = reply.snapshot;
    match dashboard.accept_insight(reply) {
        Ok(()) => ok(InsightAcceptedResponse {
            accepted: true,
            snapshot,
        }),
        Err(e) => fail(&DashError::Insight(e)),
    }
}
