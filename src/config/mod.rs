use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while resolving configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub domain: Option<String>,
    pub audience: Option<String>,
    pub algorithm: String,
    pub issuer: Option<String>,
    pub jwks_url: Option<String>,
    pub jwks_cache_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Empty means any origin is allowed
    pub cors_origins: Vec<String>,
}

/// Fully resolved identity provider settings used by the token verifier
#[derive(Debug, Clone)]
pub struct IssuerSettings {
    pub issuer: String,
    pub audience: String,
    pub algorithm: Algorithm,
    pub jwks_url: Url,
    pub cache_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("DRINKS_API_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Storage overrides; without DRINKS_STORAGE or DATABASE_URL the preset backend stands
        self.storage.database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        self.storage.backend = match lookup("DRINKS_STORAGE").as_deref() {
            Some("memory") => StorageBackend::Memory,
            Some("postgres") => StorageBackend::Postgres,
            _ if self.storage.database_url.is_some() => StorageBackend::Postgres,
            _ => self.storage.backend,
        };
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.storage.max_connections = v.parse().unwrap_or(self.storage.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.storage.connection_timeout = v.parse().unwrap_or(self.storage.connection_timeout);
        }

        // Auth overrides
        self.auth.domain = lookup("AUTH0_DOMAIN").or(self.auth.domain);
        self.auth.audience = lookup("API_AUDIENCE").or(self.auth.audience);
        self.auth.issuer = lookup("AUTH_ISSUER").or(self.auth.issuer);
        self.auth.jwks_url = lookup("AUTH_JWKS_URL").or(self.auth.jwks_url);
        if let Some(v) = lookup("AUTH_ALGORITHM") {
            self.auth.algorithm = v;
        }
        if let Some(v) = lookup("AUTH_JWKS_CACHE_SECS") {
            self.auth.jwks_cache_secs = v.parse().unwrap_or(self.auth.jwks_cache_secs);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 5000 },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                database_url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            auth: AuthConfig::defaults(),
            security: SecurityConfig { cors_origins: Vec::new() },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 5000 },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
                database_url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            auth: AuthConfig::defaults(),
            security: SecurityConfig { cors_origins: Vec::new() },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 5000 },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
                database_url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            auth: AuthConfig::defaults(),
            security: SecurityConfig { cors_origins: Vec::new() },
        }
    }
}

impl AuthConfig {
    fn defaults() -> Self {
        Self {
            domain: None,
            audience: None,
            algorithm: "RS256".to_string(),
            issuer: None,
            jwks_url: None,
            jwks_cache_secs: 600,
        }
    }

    /// Resolve issuer, key set location and algorithm.
    ///
    /// The issuer defaults to `https://<AUTH0_DOMAIN>/` and the key set to
    /// `<issuer>.well-known/jwks.json`, matching how Auth0 tenants publish keys.
    pub fn resolve(&self) -> Result<IssuerSettings, ConfigError> {
        let audience = self
            .audience
            .clone()
            .ok_or(ConfigError::Missing("API_AUDIENCE"))?;

        let issuer = match (&self.issuer, &self.domain) {
            (Some(issuer), _) => issuer.clone(),
            (None, Some(domain)) => format!("https://{}/", domain.trim_end_matches('/')),
            (None, None) => return Err(ConfigError::Missing("AUTH0_DOMAIN")),
        };

        let jwks_url = match &self.jwks_url {
            Some(raw) => Url::parse(raw).map_err(|_| ConfigError::Invalid {
                name: "AUTH_JWKS_URL",
                value: raw.clone(),
            })?,
            None => Url::parse(&issuer)
                .and_then(|base| base.join(".well-known/jwks.json"))
                .map_err(|_| ConfigError::Invalid {
                    name: "AUTH0_DOMAIN",
                    value: issuer.clone(),
                })?,
        };

        let algorithm = Algorithm::from_str(&self.algorithm).map_err(|_| ConfigError::Invalid {
            name: "AUTH_ALGORITHM",
            value: self.algorithm.clone(),
        })?;

        Ok(IssuerSettings {
            issuer,
            audience,
            algorithm,
            jwks_url,
            cache_ttl: Duration::from_secs(self.jwks_cache_secs),
        })
    }
}
