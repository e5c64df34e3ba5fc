// Presentation layer - HTTP surface for the dashboard front-end
pub mod api_error;
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_live_series, get_snapshot, health_check, list_filters, refresh_snapshot,
    stream_live_series, tick_live_series,
};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    // The NDJSON stream is excluded from compression so chunks reach clients per tick
    let compressed = Router::new()
        .route("/filters", get(list_filters))
        .route("/snapshot", get(get_snapshot))
        .route("/snapshot/refresh", post(refresh_snapshot))
        .route("/live/fg", get(get_live_series))
        .route("/live/fg/tick", post(tick_live_series))
        .layer(CompressionLayer::new());

    Router::new()
        .route("/healthz", get(health_check))
        .route("/live/fg/stream", get(stream_live_series))
        .merge(compressed)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
