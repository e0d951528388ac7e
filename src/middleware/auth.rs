use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{AuthError, TokenVerifier};
use crate::error::ApiError;

/// Middleware state: the verifier plus the scope a route requires
#[derive(Clone)]
pub struct PermissionGate {
    verifier: Arc<TokenVerifier>,
    permission: &'static str,
}

impl PermissionGate {
    pub fn new(state: &AppState, permission: &'static str) -> Self {
        Self {
            verifier: state.verifier.clone(),
            permission,
        }
    }
}

/// Rejects the request unless it carries a verified token granting the gate's permission.
/// On success the token claims are stored in the request extensions.
pub async fn require_permission(
    State(gate): State<PermissionGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();
    let reject = |err: AuthError| {
        tracing::warn!(
            "Rejected {} (requires {}): {} [{} {}]",
            path,
            gate.permission,
            err,
            err.code(),
            err.status().as_u16()
        );
        ApiError::from(err)
    };

    let token = extract_bearer_token(request.headers())
        .map_err(reject)?
        .to_string();
    let claims = gate.verifier.verify(&token).await.map_err(reject)?;
    claims.check_permission(gate.permission).map_err(reject)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthError::MissingHeader)?;
    let value = header.to_str().map_err(|_| AuthError::Malformed)?;

    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [] => Err(AuthError::MissingHeader),
        [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => {
            Err(AuthError::MissingBearerPrefix)
        }
        [_] => Err(AuthError::MissingToken),
        [_, token] => Ok(*token),
        _ => Err(AuthError::NotBearerToken),
    }
}
