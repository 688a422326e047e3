use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{handlers, state::AppState};

/// Build the primary axum router with the provided shared application state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/jobs", post(handlers::jobs::submit::submit))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

async fn health_handler() -> impl IntoResponse {
    // Liveness: the process is up, regardless of the store.
    (StatusCode::OK, "OK")
}

async fn ready_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    match state.job_store().ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(error) => {
            tracing::warn!(%error, "job store not reachable");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
