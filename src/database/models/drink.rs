use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Column width of `drink.title`
pub const TITLE_MAX_LEN: usize = 80;

/// Validation failures for drink input
#[derive(Debug, Error)]
pub enum DrinkError {
    #[error("title is required")]
    MissingTitle,

    #[error("title must be a non-empty string")]
    EmptyTitle,

    #[error("title exceeds 80 characters ({0})")]
    TitleTooLong(usize),

    #[error("recipe is required")]
    MissingRecipe,

    #[error("recipe must be an ingredient or a list of ingredients: {0}")]
    InvalidRecipe(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

/// Ingredient as exposed by the public short projection (no name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecipeInput {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

/// Ordered list of ingredients, persisted as JSON text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Recipe(Vec<Ingredient>);

impl Recipe {
    pub fn new(ingredients: Vec<Ingredient>) -> Self {
        Self(ingredients)
    }

    /// Accepts either a list of ingredients or a single ingredient object
    pub fn from_value(value: Value) -> Result<Self, DrinkError> {
        if value.is_null() {
            return Err(DrinkError::MissingRecipe);
        }
        match serde_json::from_value::<RecipeInput>(value)? {
            RecipeInput::Many(ingredients) => Ok(Self(ingredients)),
            RecipeInput::One(ingredient) => Ok(Self(vec![ingredient])),
        }
    }

    /// Parse the stored column text
    pub fn from_text(text: &str) -> Result<Self, DrinkError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.0
    }

    pub fn short(&self) -> Vec<ShortIngredient> {
        self.0
            .iter()
            .map(|i| ShortIngredient {
                color: i.color.clone(),
                parts: i.parts,
            })
            .collect()
    }
}

/// A persisted drink. Serializes as the long projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drink {
    pub id: i32,
    pub title: String,
    pub recipe: Recipe,
}

/// Public projection of a drink: ingredient names are withheld
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortDrink {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

impl Drink {
    pub fn short(&self) -> ShortDrink {
        ShortDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self.recipe.short(),
        }
    }

    pub fn apply(&mut self, patch: DrinkPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(recipe) = patch.recipe {
            self.recipe = recipe;
        }
    }
}

/// A drink that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Recipe,
}

impl NewDrink {
    /// Parse a create request body: `{"title": ..., "recipe": ...}`
    pub fn from_json(body: &Value) -> Result<Self, DrinkError> {
        let title = body.get("title").ok_or(DrinkError::MissingTitle)?;
        let recipe = body.get("recipe").cloned().unwrap_or(Value::Null);

        Ok(Self {
            title: validate_title(title)?,
            recipe: Recipe::from_value(recipe)?,
        })
    }

    /// The drink inserted when the table is reset
    pub fn seed() -> Self {
        Self {
            title: "water".to_string(),
            recipe: Recipe::new(vec![Ingredient {
                name: "water".to_string(),
                color: "blue".to_string(),
                parts: 1,
            }]),
        }
    }
}

/// Partial update; absent keys leave the column untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrinkPatch {
    pub title: Option<String>,
    pub recipe: Option<Recipe>,
}

impl DrinkPatch {
    pub fn from_json(body: &serde_json::Map<String, Value>) -> Result<Self, DrinkError> {
        let title = body.get("title").map(validate_title).transpose()?;
        let recipe = body
            .get("recipe")
            .cloned()
            .map(Recipe::from_value)
            .transpose()?;

        Ok(Self { title, recipe })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.recipe.is_none()
    }
}

fn validate_title(value: &Value) -> Result<String, DrinkError> {
    let title = match value {
        Value::String(s) => s.trim(),
        Value::Null => return Err(DrinkError::MissingTitle),
        _ => return Err(DrinkError::EmptyTitle),
    };
    if title.is_empty() {
        return Err(DrinkError::EmptyTitle);
    }
    let len = title.chars().count();
    if len > TITLE_MAX_LEN {
        return Err(DrinkError::TitleTooLong(len));
    }
    Ok(title.to_string())
}
