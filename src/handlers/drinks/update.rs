use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::database::models::{Drink, DrinkPatch};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

use super::{drink_id, DrinksBody};

/// PATCH /drinks/:id - Replace the title and/or recipe of a drink
pub async fn patch(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<DrinksBody<Drink>> {
    let id = drink_id(path)?;
    let mut drink = state.store.find(id).await?.ok_or_else(ApiError::not_found)?;

    // Missing, unreadable, or empty bodies are all a bad request
    let fields = match body {
        Ok(Json(Value::Object(fields))) if !fields.is_empty() => fields,
        _ => return Err(ApiError::bad_request()),
    };

    let patch = DrinkPatch::from_json(&fields)?;
    if patch.is_empty() {
        tracing::debug!("PATCH /drinks/{} carried no drink fields", id);
    }
    drink.apply(patch);

    let drink = state.store.update(&drink).await?;
    tracing::info!("Updated drink {} '{}'", drink.id, drink.title);
    Ok(ApiResponse::success(DrinksBody { drinks: drink }))
}
