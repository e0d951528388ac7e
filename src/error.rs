// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::database::models::DrinkError;
use crate::database::DatabaseError;

/// HTTP API error rendered as `{"success": false, "error": <status>, "message": ...}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized, every auth gate failure lands here
    Unauthorized {
        message: String,
        code: &'static str,
    },

    // 404 Not Found
    NotFound(String),

    // 405 Method Not Allowed
    MethodNotAllowed(String),

    // 422 Unprocessable Entity
    UnprocessableEntity(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized { message, .. } => message,
            ApiError::NotFound(msg) => msg,
            ApiError::MethodNotAllowed(msg) => msg,
            ApiError::UnprocessableEntity(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "error": self.status_code().as_u16(),
            "message": self.message()
        });
        if let ApiError::Unauthorized { code, .. } = self {
            body["code"] = json!(code);
        }
        body
    }
}

// Constructors with the standard client messages
impl ApiError {
    pub fn bad_request() -> Self {
        ApiError::BadRequest("Bad Request".to_string())
    }

    pub fn not_found() -> Self {
        ApiError::NotFound("resource not found".to_string())
    }

    pub fn method_not_allowed() -> Self {
        ApiError::MethodNotAllowed("method not allowed".to_string())
    }

    pub fn unprocessable() -> Self {
        ApiError::UnprocessableEntity("unprocessable".to_string())
    }

    pub fn internal_server_error() -> Self {
        ApiError::InternalServerError("internal server error".to_string())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Permission failures (403 at the auth layer) are reported as 401 as well
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized {
            message: err.to_string(),
            code: err.code(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(_) => ApiError::not_found(),
            DatabaseError::DuplicateTitle(title) => {
                tracing::warn!("Rejected duplicate drink title '{}'", title);
                ApiError::unprocessable()
            }
            other => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Drink store error: {}", other);
                ApiError::unprocessable()
            }
        }
    }
}

impl From<DrinkError> for ApiError {
    fn from(err: DrinkError) -> Self {
        tracing::debug!("Rejected drink input: {}", err);
        ApiError::unprocessable()
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
