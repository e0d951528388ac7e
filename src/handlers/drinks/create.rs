use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::auth::Claims;
use crate::database::models::{Drink, NewDrink};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

use super::DrinksBody;

/// POST /drinks - Create a drink from `{"title", "recipe"}`
pub async fn post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<DrinksBody<Drink>> {
    let Json(body) = body.map_err(|rejection| {
        tracing::debug!("Unreadable create body: {}", rejection);
        ApiError::bad_request()
    })?;

    let new_drink = NewDrink::from_json(&body)?;
    let drink = state.store.insert(new_drink).await?;

    tracing::info!(
        "Created drink {} '{}' for {}",
        drink.id,
        drink.title,
        claims.sub.as_deref().unwrap_or("unknown subject")
    );
    Ok(ApiResponse::success(DrinksBody { drinks: drink }))
}
