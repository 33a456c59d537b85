use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::middleware::ApiResponse;
use crate::state::AppState;

/// GET /api/v1 - Service information
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "endpoints": {
            "public": ["/api/v1", "/api/v1/health"],
            "protected": [
                "/api/v1/card",
                "/api/v1/deck",
                "/api/v1/deck/content",
                "/api/v1/set",
                "/api/v1/set/content",
                "/api/v1/user"
            ]
        }
    }))
}

/// GET /api/v1/health - Liveness plus document store reachability
pub async fn health(State(state): State<AppState>) -> ApiResponse<Value> {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => ApiResponse::success(json!({ "status": "healthy", "timestamp": now })),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            ApiResponse::with_status(
                json!({ "status": "unhealthy", "timestamp": now, "err": "STORE_UNAVAILABLE" }),
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}
