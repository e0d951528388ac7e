//! Bearer-token verification against the identity provider's key set.
//!
//! Tokens are RS256 JWTs issued by Auth0. The signing key is selected by the
//! token's `kid` from the issuer JWKS, then signature, issuer, audience and
//! expiry are checked. Route permissions are matched against the
//! `permissions` claim.

pub mod claims;
pub mod error;
pub mod jwks;
pub mod verifier;

pub use claims::Claims;
pub use error::AuthError;
pub use jwks::{HttpKeySetSource, KeyCache, KeySetError, KeySetSource};
pub use verifier::TokenVerifier;

/// Scopes granted by the identity provider for the drinks routes
pub mod permissions {
    pub const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
    pub const POST_DRINKS: &str = "post:drinks";
    pub const PATCH_DRINKS: &str = "patch:drinks";
    pub const DELETE_DRINKS: &str = "delete:drinks";
}
