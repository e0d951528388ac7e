use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{StorageBackend, StorageConfig};
use crate::database::memory::MemoryDrinkStore;
use crate::database::models::DrinkError;
use crate::database::postgres::PgDrinkStore;
use crate::database::store::DrinkStore;

/// Errors from the drink store backends
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("A drink titled '{0}' already exists")]
    DuplicateTitle(String),

    #[error("Stored recipe for drink {id} is unreadable: {source}")]
    CorruptRecipe {
        id: i32,
        #[source]
        source: DrinkError,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Open a PostgreSQL pool using the configured limits
pub async fn connect_pool(config: &StorageConfig) -> Result<PgPool, DatabaseError> {
    let url = config
        .database_url
        .as_deref()
        .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(url)
        .await?;

    info!(
        "Created database pool (max_connections={})",
        config.max_connections
    );
    Ok(pool)
}

/// Build the configured store backend, creating the table if needed
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn DrinkStore>, DatabaseError> {
    match config.backend {
        StorageBackend::Postgres => {
            let store = PgDrinkStore::new(connect_pool(config).await?);
            store.create_table().await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            info!("Using in-memory drink store; data is lost on restart");
            Ok(Arc::new(MemoryDrinkStore::new()))
        }
    }
}

/// Drop and reseed the configured store. Returns false for the in-memory backend.
pub async fn reset_store(config: &StorageConfig) -> Result<bool, DatabaseError> {
    if config.backend == StorageBackend::Memory {
        warn!("Nothing to reset with the in-memory store; set DATABASE_URL");
        return Ok(false);
    }
    open_store(config).await?.reset().await?;
    info!("Drink table reset");
    Ok(true)
}
