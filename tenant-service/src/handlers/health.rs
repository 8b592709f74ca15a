use serde_json::json;
use service_core::axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::startup::AppState;

/// Liveness probe; reports the tenant store status.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": state.config.service_name,
                "version": env!("CARGO_PKG_VERSION"),
                "root_domain": state.policy.root_domain(),
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Tenant store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": state.config.service_name,
                    "error": "tenant store unavailable",
                })),
            )
        }
    }
}

/// Readiness probe for K8s.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match state.store.health_check().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        crate::services::get_metrics(),
    )
}
