/// Health check endpoints for liveness and ledger reachability
use crate::context::AppContext;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/endpoints", get(endpoint_health))
}

/// Liveness: responds whenever the process is serving
pub async fn health_basic() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// One entry per ledger endpoint. 503 when none of them is usable.
pub async fn endpoint_health(State(ctx): State<AppContext>) -> (StatusCode, Json<serde_json::Value>) {
    let statuses = ctx.endpoints.statuses().await;

    let status = if statuses.iter().any(|s| s.healthy) {
        StatusCode::OK
    } else {
        tracing::warn!("endpoint health requested while no endpoint is healthy");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(serde_json::json!(statuses)))
}
