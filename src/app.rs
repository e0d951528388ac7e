use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{permissions, TokenVerifier};
use crate::config::SecurityConfig;
use crate::database::DrinkStore;
use crate::handlers::{drinks, system};
use crate::middleware::{require_permission, PermissionGate};

/// Application context shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DrinkStore>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn DrinkStore>, verifier: TokenVerifier) -> Self {
        Self {
            store,
            verifier: Arc::new(verifier),
        }
    }
}

pub fn router(state: AppState, security: &SecurityConfig) -> Router {
    let gate = |permission: &'static str| {
        from_fn_with_state(PermissionGate::new(&state, permission), require_permission)
    };

    Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Drinks menu, one required scope per operation
        .route(
            "/drinks",
            get(drinks::list)
                .merge(post(drinks::create).route_layer(gate(permissions::POST_DRINKS))),
        )
        .route(
            "/drinks-detail",
            get(drinks::detail).route_layer(gate(permissions::GET_DRINKS_DETAIL)),
        )
        .route(
            "/drinks/:id",
            patch(drinks::update)
                .route_layer(gate(permissions::PATCH_DRINKS))
                .merge(delete(drinks::remove).route_layer(gate(permissions::DELETE_DRINKS))),
        )
        .method_not_allowed_fallback(system::method_not_allowed)
        .fallback(system::not_found)
        .with_state(state)
        // Global middleware
        .layer(cors_layer(security))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
