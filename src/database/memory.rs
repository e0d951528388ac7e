use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{Drink, NewDrink};
use crate::database::store::DrinkStore;

/// In-process drink store with the same constraints as the `drink` table.
///
/// Ids are assigned from a monotonically increasing counter and are never
/// reused, even after a delete.
#[derive(Default)]
pub struct MemoryDrinkStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    rows: BTreeMap<i32, Drink>,
    last_id: i32,
}

impl MemoryState {
    fn title_taken(&self, title: &str, except: Option<i32>) -> bool {
        self.rows
            .values()
            .any(|d| d.title == title && Some(d.id) != except)
    }

    fn insert(&mut self, drink: NewDrink) -> Result<Drink, DatabaseError> {
        if self.title_taken(&drink.title, None) {
            return Err(DatabaseError::DuplicateTitle(drink.title));
        }
        self.last_id += 1;
        let row = Drink {
            id: self.last_id,
            title: drink.title,
            recipe: drink.recipe,
        };
        self.rows.insert(row.id, row.clone());
        Ok(row)
    }
}

impl MemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DrinkStore for MemoryDrinkStore {
    async fn list(&self) -> Result<Vec<Drink>, DatabaseError> {
        Ok(self.state.read().await.rows.values().cloned().collect())
    }

    async fn find(&self, id: i32) -> Result<Option<Drink>, DatabaseError> {
        Ok(self.state.read().await.rows.get(&id).cloned())
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink, DatabaseError> {
        self.state.write().await.insert(drink)
    }

    async fn update(&self, drink: &Drink) -> Result<Drink, DatabaseError> {
        let mut state = self.state.write().await;
        if !state.rows.contains_key(&drink.id) {
            return Err(DatabaseError::NotFound(format!("drink {}", drink.id)));
        }
        if state.title_taken(&drink.title, Some(drink.id)) {
            return Err(DatabaseError::DuplicateTitle(drink.title.clone()));
        }
        state.rows.insert(drink.id, drink.clone());
        Ok(drink.clone())
    }

    async fn delete(&self, id: i32) -> Result<bool, DatabaseError> {
        Ok(self.state.write().await.rows.remove(&id).is_some())
    }

    async fn reset(&self) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        *state = MemoryState::default();
        state.insert(NewDrink::seed())?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
