use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{Drink, NewDrink};

/// Persistence operations over the `drink` table
#[async_trait]
pub trait DrinkStore: Send + Sync {
    /// All drinks ordered by id
    async fn list(&self) -> Result<Vec<Drink>, DatabaseError>;

    async fn find(&self, id: i32) -> Result<Option<Drink>, DatabaseError>;

    /// Persist a new drink and return it with its assigned id
    async fn insert(&self, drink: NewDrink) -> Result<Drink, DatabaseError>;

    /// Write every column of an existing drink. Fails with `NotFound` if the row is gone.
    async fn update(&self, drink: &Drink) -> Result<Drink, DatabaseError>;

    /// Returns false when no row had that id
    async fn delete(&self, id: i32) -> Result<bool, DatabaseError>;

    /// Drop all drinks and recreate the table with the seed drink
    async fn reset(&self) -> Result<(), DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}
