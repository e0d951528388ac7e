use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET / - Service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "drinks": "GET /drinks (public)",
            "drinks_detail": "GET /drinks-detail (get:drinks-detail)",
            "create": "POST /drinks (post:drinks)",
            "update": "PATCH /drinks/:id (patch:drinks)",
            "delete": "DELETE /drinks/:id (delete:drinks)",
        }
    }))
}

/// GET /health - Store connectivity check
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => Ok(Json(json!({
            "success": true,
            "status": "ok",
            "timestamp": now,
            "database": "ok"
        }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("database unavailable"))
        }
    }
}

/// Unknown routes get the uniform 404 body
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// Known path, unsupported method
pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}
