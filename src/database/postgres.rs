use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};

use crate::database::manager::DatabaseError;
use crate::database::models::{Drink, NewDrink, Recipe};
use crate::database::store::DrinkStore;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS drink (
        id SERIAL PRIMARY KEY,
        title VARCHAR(80) NOT NULL UNIQUE,
        recipe TEXT NOT NULL
    )
"#;

/// Raw `drink` row; the recipe column holds serialized JSON
#[derive(Debug, FromRow)]
struct DrinkRow {
    id: i32,
    title: String,
    recipe: String,
}

impl TryFrom<DrinkRow> for Drink {
    type Error = DatabaseError;

    fn try_from(row: DrinkRow) -> Result<Self, Self::Error> {
        let recipe = Recipe::from_text(&row.recipe).map_err(|source| DatabaseError::CorruptRecipe {
            id: row.id,
            source,
        })?;
        Ok(Drink {
            id: row.id,
            title: row.title,
            recipe,
        })
    }
}

/// PostgreSQL-backed drink store
pub struct PgDrinkStore {
    pool: PgPool,
}

impl PgDrinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_table(&self) -> Result<(), DatabaseError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

/// Translate unique violations on `title` into a domain error
fn map_write_error(err: sqlx::Error, title: &str) -> DatabaseError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DatabaseError::DuplicateTitle(title.to_string())
        }
        other => DatabaseError::Sqlx(other),
    }
}

#[async_trait]
impl DrinkStore for PgDrinkStore {
    async fn list(&self) -> Result<Vec<Drink>, DatabaseError> {
        let rows: Vec<DrinkRow> =
            sqlx::query_as("SELECT id, title, recipe FROM drink ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(Drink::try_from).collect()
    }

    async fn find(&self, id: i32) -> Result<Option<Drink>, DatabaseError> {
        let row: Option<DrinkRow> =
            sqlx::query_as("SELECT id, title, recipe FROM drink WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Drink::try_from).transpose()
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink, DatabaseError> {
        let recipe = drink.recipe.to_text()?;
        let row: DrinkRow = sqlx::query_as(
            "INSERT INTO drink (title, recipe) VALUES ($1, $2) RETURNING id, title, recipe",
        )
        .bind(&drink.title)
        .bind(&recipe)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &drink.title))?;

        debug!("Inserted drink {} ({})", row.id, row.title);
        Drink::try_from(row)
    }

    async fn update(&self, drink: &Drink) -> Result<Drink, DatabaseError> {
        let recipe = drink.recipe.to_text()?;
        let row: Option<DrinkRow> = sqlx::query_as(
            "UPDATE drink SET title = $2, recipe = $3 WHERE id = $1 RETURNING id, title, recipe",
        )
        .bind(drink.id)
        .bind(&drink.title)
        .bind(&recipe)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &drink.title))?;

        match row {
            Some(row) => Drink::try_from(row),
            None => Err(DatabaseError::NotFound(format!("drink {}", drink.id))),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM drink WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reset(&self) -> Result<(), DatabaseError> {
        let seed = NewDrink::seed();
        let recipe = seed.recipe.to_text()?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DROP TABLE IF EXISTS drink")
            .execute(&mut *tx)
            .await?;
        sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO drink (title, recipe) VALUES ($1, $2)")
            .bind(&seed.title)
            .bind(&recipe)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Recreated drink table with seed drink '{}'", seed.title);
        Ok(())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_converts_to_drink() {
        let row = DrinkRow {
            id: 3,
            title: "matcha".to_string(),
            recipe: r#"[{"name":"matcha","color":"green","parts":1}]"#.to_string(),
        };
        let drink = Drink::try_from(row).unwrap();
        assert_eq!(drink.id, 3);
        assert_eq!(drink.recipe.ingredients()[0].color, "green");
    }

    #[test]
    fn unreadable_recipe_is_reported_with_id() {
        let row = DrinkRow {
            id: 9,
            title: "mystery".to_string(),
            recipe: "null".to_string(),
        };
        match Drink::try_from(row) {
            Err(DatabaseError::CorruptRecipe { id, .. }) => assert_eq!(id, 9),
            other => panic!("expected CorruptRecipe, got {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore = "needs a scratch database in DRINKS_TEST_DATABASE_URL"]
    async fn round_trip_against_postgres() {
        let url = std::env::var("DRINKS_TEST_DATABASE_URL")
            .expect("DRINKS_TEST_DATABASE_URL must point at a scratch database");
        let pool = PgPool::connect(&url).await.unwrap();
        let store = PgDrinkStore::new(pool.clone());
        store.reset().await.unwrap();

        let drinks = store.list().await.unwrap();
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].title, "water");

        let duplicate = store.insert(NewDrink::seed()).await;
        assert!(matches!(duplicate, Err(DatabaseError::DuplicateTitle(_))));

        assert!(store.delete(drinks[0].id).await.unwrap());
        assert!(store.find(drinks[0].id).await.unwrap().is_none());
        pool.close().await;
    }
}
