use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the bearer-token gate.
///
/// Each variant carries the code and status the identity layer assigns it.
/// The HTTP boundary reports all of them as 401 (see `ApiError::from`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    MissingHeader,

    #[error("Authorization header must start with \"Bearer\".")]
    MissingBearerPrefix,

    #[error("Token not found.")]
    MissingToken,

    #[error("Authorization header must be bearer token.")]
    NotBearerToken,

    #[error("Authorization malformed.")]
    Malformed,

    #[error("Unable to parse authentication token.")]
    Unparsable,

    #[error("Unable to find the appropriate key.")]
    UnknownKey,

    #[error("Unable to fetch signing keys.")]
    KeySetUnavailable,

    #[error("Token expired.")]
    TokenExpired,

    #[error("Incorrect claims. Please, check the audience and issuer.")]
    IncorrectClaims,

    #[error("Permissions not included in JWT.")]
    PermissionsMissing,

    #[error("Permission not found.")]
    PermissionDenied,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "authorization_header_missing",
            AuthError::MissingBearerPrefix
            | AuthError::MissingToken
            | AuthError::NotBearerToken
            | AuthError::Malformed
            | AuthError::Unparsable
            | AuthError::UnknownKey
            | AuthError::KeySetUnavailable => "invalid_header",
            AuthError::TokenExpired => "token_expired",
            AuthError::IncorrectClaims | AuthError::PermissionsMissing => "invalid_claims",
            AuthError::PermissionDenied => "unauthorized",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unparsable
            | AuthError::UnknownKey
            | AuthError::KeySetUnavailable
            | AuthError::PermissionsMissing => StatusCode::BAD_REQUEST,
            AuthError::PermissionDenied => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}
