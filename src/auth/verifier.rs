use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, DecodingKey, Validation};
use tracing::{debug, error};

use super::claims::Claims;
use super::error::AuthError;
use super::jwks::{HttpKeySetSource, KeyCache, KeySetError, KeySetSource};
use crate::config::IssuerSettings;

/// Verifies bearer tokens against the issuer's published key set
pub struct TokenVerifier {
    settings: IssuerSettings,
    keys: KeyCache,
}

impl TokenVerifier {
    pub fn new(settings: IssuerSettings, source: Arc<dyn KeySetSource>) -> Self {
        let keys = KeyCache::new(source, settings.cache_ttl);
        Self { settings, keys }
    }

    /// Verifier that fetches keys from `settings.jwks_url`
    pub fn from_settings(settings: IssuerSettings) -> Result<Self, KeySetError> {
        let source = HttpKeySetSource::new(settings.jwks_url.clone())?;
        Ok(Self::new(settings, Arc::new(source)))
    }

    pub fn settings(&self) -> &IssuerSettings {
        &self.settings
    }

    /// Check signature, issuer, audience and expiry, returning the payload
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::Unparsable)?;
        let kid = header.kid.ok_or(AuthError::Malformed)?;

        let jwk = self
            .keys
            .find(&kid)
            .await
            .map_err(|e| {
                error!("Failed to fetch signing keys from {}: {}", self.settings.jwks_url, e);
                AuthError::KeySetUnavailable
            })?
            .ok_or(AuthError::UnknownKey)?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|_| AuthError::UnknownKey)?;

        let mut validation = Validation::new(self.settings.algorithm);
        validation.set_audience(&[&self.settings.audience]);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => AuthError::IncorrectClaims,
            _ => AuthError::Unparsable,
        })?;

        debug!(
            "Verified token for {} (kid {})",
            data.claims.sub.as_deref().unwrap_or("unknown subject"),
            kid
        );
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwks::StaticKeySet;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::{json, Value};
    use std::time::Duration;
    use url::Url;

    const PRIVATE_KEY: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/test_rsa.pem"
    ));
    const JWKS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/jwks.json"));
    const KID: &str = "drinks-test-key";
    const ISSUER: &str = "https://coffee-shop.test/";
    const AUDIENCE: &str = "drinks";

    fn verifier() -> TokenVerifier {
        let settings = IssuerSettings {
            issuer: ISSUER.to_string(),
            audience: AUDIENCE.to_string(),
            algorithm: Algorithm::RS256,
            jwks_url: Url::parse("https://coffee-shop.test/.well-known/jwks.json").unwrap(),
            cache_ttl: Duration::from_secs(600),
        };
        let keys = serde_json::from_str(JWKS).unwrap();
        TokenVerifier::new(settings, Arc::new(StaticKeySet(keys)))
    }

    fn token_with(kid: Option<&str>, claims: Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = kid.map(str::to_string);
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
        encode(&header, &claims, &key).unwrap()
    }

    fn claims(overrides: Value) -> Value {
        let now = chrono::Utc::now().timestamp();
        let mut base = json!({
            "iss": ISSUER,
            "sub": "auth0|manager",
            "aud": AUDIENCE,
            "iat": now,
            "exp": now + 3600,
            "permissions": ["get:drinks-detail"]
        });
        if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
            base.extend(overrides.clone());
        }
        base
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let token = token_with(Some(KID), claims(json!({})));
        let claims = verifier().verify(&token).await.unwrap();
        assert_eq!(claims.sub.as_deref(), Some("auth0|manager"));
        assert!(claims.check_permission("get:drinks-detail").is_ok());
    }

    #[tokio::test]
    async fn rejects_garbage() {
        assert_eq!(
            verifier().verify("not-a-jwt").await.unwrap_err(),
            AuthError::Unparsable
        );
    }

    #[tokio::test]
    async fn rejects_token_without_kid() {
        let token = token_with(None, claims(json!({})));
        assert_eq!(verifier().verify(&token).await.unwrap_err(), AuthError::Malformed);
    }

    #[tokio::test]
    async fn rejects_unknown_kid() {
        let token = token_with(Some("someone-else"), claims(json!({})));
        assert_eq!(verifier().verify(&token).await.unwrap_err(), AuthError::UnknownKey);
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let now = chrono::Utc::now().timestamp();
        let token = token_with(Some(KID), claims(json!({"exp": now - 3600})));
        assert_eq!(verifier().verify(&token).await.unwrap_err(), AuthError::TokenExpired);
    }

    #[tokio::test]
    async fn rejects_wrong_audience_or_issuer() {
        let token = token_with(Some(KID), claims(json!({"aud": "payments"})));
        assert_eq!(
            verifier().verify(&token).await.unwrap_err(),
            AuthError::IncorrectClaims
        );

        let token = token_with(Some(KID), claims(json!({"iss": "https://evil.test/"})));
        assert_eq!(
            verifier().verify(&token).await.unwrap_err(),
            AuthError::IncorrectClaims
        );
    }

    #[tokio::test]
    async fn rejects_tampered_signature() {
        let token = token_with(Some(KID), claims(json!({})));
        let forged = token_with(Some(KID), claims(json!({"permissions": ["delete:drinks"]})));
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged_payload;
        let tampered = parts.join(".");

        assert_eq!(
            verifier().verify(&tampered).await.unwrap_err(),
            AuthError::Unparsable
        );
    }
}
