#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use url::Url;

use drinks_api::auth::{HttpKeySetSource, TokenVerifier};
use drinks_api::config::{IssuerSettings, SecurityConfig};
use drinks_api::database::models::{Drink, Ingredient, NewDrink, Recipe};
use drinks_api::database::{DrinkStore, MemoryDrinkStore};
use drinks_api::{router, AppState};

pub const ISSUER: &str = "https://coffee-shop.test/";
pub const AUDIENCE: &str = "drinks";
pub const KID: &str = "drinks-test-key";

const PRIVATE_KEY: &str = include_str!("../fixtures/test_rsa.pem");
const JWKS: &str = include_str!("../fixtures/jwks.json");

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryDrinkStore>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn seed(&self, title: &str) -> Result<Drink> {
        let drink = NewDrink {
            title: title.to_string(),
            recipe: Recipe::new(vec![
                Ingredient {
                    name: "espresso".to_string(),
                    color: "brown".to_string(),
                    parts: 1,
                },
                Ingredient {
                    name: "milk".to_string(),
                    color: "white".to_string(),
                    parts: 3,
                },
            ]),
        };
        Ok(self.store.insert(drink).await?)
    }

    pub async fn store_is_empty(&self) -> Result<bool> {
        Ok(self.store.list().await?.is_empty())
    }

    /// The stored drink as JSON, or null
    pub async fn store_find(&self, id: i32) -> Result<Value> {
        Ok(serde_json::to_value(self.store.find(id).await?)?)
    }
}

/// Bind a free local port and serve `app` on it for the rest of the test
async fn serve(app: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

/// Fake identity provider publishing the fixture key set
async fn spawn_issuer() -> Result<Url> {
    let keys: Value = serde_json::from_str(JWKS)?;
    let app = Router::new().route(
        "/.well-known/jwks.json",
        get(move || {
            let keys = keys.clone();
            async move { Json(keys) }
        }),
    );
    let base = serve(app).await?;
    Ok(Url::parse(&format!("{}/.well-known/jwks.json", base))?)
}

/// Start the API against an in-memory store and a local key set server
pub async fn spawn_app() -> Result<TestApp> {
    let jwks_url = spawn_issuer().await?;
    spawn_app_with_jwks(jwks_url).await
}

pub async fn spawn_app_with_jwks(jwks_url: Url) -> Result<TestApp> {
    let settings = IssuerSettings {
        issuer: ISSUER.to_string(),
        audience: AUDIENCE.to_string(),
        algorithm: Algorithm::RS256,
        jwks_url: jwks_url.clone(),
        cache_ttl: Duration::from_secs(600),
    };
    let verifier = TokenVerifier::new(settings, Arc::new(HttpKeySetSource::new(jwks_url)?));

    let store = Arc::new(MemoryDrinkStore::new());
    let state = AppState::new(store.clone(), verifier);
    let app = router(state, &SecurityConfig { cors_origins: Vec::new() });

    Ok(TestApp {
        base_url: serve(app).await?,
        client: reqwest::Client::new(),
        store,
    })
}

/// Claims for a live token granting `permissions`
pub fn claims(permissions: &[&str]) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "iss": ISSUER,
        "sub": "auth0|barista",
        "aud": AUDIENCE,
        "iat": now,
        "exp": now + 3600,
        "permissions": permissions,
    })
}

pub fn sign(claims: &Value, kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).expect("fixture key");
    encode(&header, claims, &key).expect("sign token")
}

pub fn token(permissions: &[&str]) -> String {
    sign(&claims(permissions), Some(KID))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
