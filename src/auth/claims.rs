use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::AuthError;

/// Verified access token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// String or list of strings; checked by the verifier, kept raw here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// RBAC permissions as issued by Auth0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    /// OAuth scope string, space separated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Claims {
    /// Granted scopes: the `permissions` array, else the split `scope` string
    pub fn granted(&self) -> Option<Vec<&str>> {
        if let Some(permissions) = &self.permissions {
            return Some(permissions.iter().map(String::as_str).collect());
        }
        self.scope
            .as_deref()
            .map(|scope| scope.split_whitespace().collect())
    }

    pub fn check_permission(&self, required: &str) -> Result<(), AuthError> {
        let granted = self.granted().ok_or(AuthError::PermissionsMissing)?;
        if granted.iter().any(|p| *p == required) {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied)
        }
    }
}
