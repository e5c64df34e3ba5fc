// HTTP request handlers
use crate::application::live_series::{LiveSeries, LiveStatus};
use crate::domain::filter::{DashboardFilter, FilterCatalog};
use crate::domain::metrics::Snapshot;
use crate::infrastructure::chunked_json::stream_from_broadcast;
use crate::presentation::api_error::ApiError;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub plant: Option<String>,
    pub machine: Option<String>,
}

#[derive(Serialize)]
pub struct FiltersResponse {
    #[serde(flatten)]
    pub catalog: FilterCatalog,
    pub selected: Option<DashboardFilter>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Selectable plants and machines, plus the current selection
pub async fn list_filters(State(state): State<Arc<AppState>>) -> Json<FiltersResponse> {
    let service = &state.dashboard_service;
    Json(FiltersResponse {
        catalog: service.catalog().clone(),
        selected: service.current_filter(),
    })
}

/// Snapshot for the selection; regenerated only when the selection changed
pub async fn get_snapshot(
    Query(query): Query<FilterQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Arc<Snapshot>>, ApiError> {
    let snapshot = state
        .dashboard_service
        .snapshot(query.plant, query.machine)?;
    Ok(Json(snapshot))
}

/// Manual refresh
pub async fn refresh_snapshot(
    Query(query): Query<FilterQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Arc<Snapshot>>, ApiError> {
    let snapshot = state
        .dashboard_service
        .refresh(query.plant, query.machine)?;
    Ok(Json(snapshot))
}

/// Updater state and the current live FG series
pub async fn get_live_series(State(state): State<Arc<AppState>>) -> Json<LiveStatus> {
    Json(state.dashboard_service.live_status())
}

/// Advance the live series by one tick right away
pub async fn tick_live_series(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LiveSeries>, StatusCode> {
    state
        .dashboard_service
        .advance_live()
        .map(Json)
        .ok_or(StatusCode::CONFLICT)
}

/// Live FG series as newline-delimited JSON, one line per tick
pub async fn stream_live_series(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let service = &state.dashboard_service;
    // Subscribe before reading the current value so no tick falls in between
    let rx = service.subscribe();
    stream_from_broadcast(service.live_series(), rx)
}
