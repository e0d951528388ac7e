use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;

/// Wrapper for API responses that adds `"success": true` to the body.
///
/// The payload must serialize to a JSON object; its keys are placed next to
/// the success flag (`{"success": true, "drinks": [...]}`).
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with 200 status
    pub fn success(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let fields = match serde_json::to_value(&self.data) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => {
                tracing::error!("Response payload is not a JSON object: {}", other);
                return ApiError::internal_server_error().into_response();
            }
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return ApiError::internal_server_error().into_response();
            }
        };

        let mut envelope = json!({ "success": true });
        if let Value::Object(map) = &mut envelope {
            map.extend(fields);
        }

        (StatusCode::OK, Json(envelope)).into_response()
    }
}

// Convenience type alias
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
