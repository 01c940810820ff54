pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::dashboard::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::handle_index))
        .route("/health", get(health::health_handler))
        .route("/api/v1/metrics", get(handlers::handle_catalog))
        .route("/api/v1/sessions", post(handlers::handle_open_session))
        .route(
            "/api/v1/sessions/:id/snapshot.csv",
            get(handlers::handle_snapshot_csv),
        )
        .route(
            "/api/v1/sessions/:id/metrics/:metric",
            get(handlers::handle_metric_view),
        )
        .route(
            "/api/v1/sessions/:id/timeseries",
            get(handlers::handle_time_series),
        )
        .with_state(state)
}
