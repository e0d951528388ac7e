use axum::extract::State;

use crate::app::AppState;
use crate::database::models::ShortDrink;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

use super::DrinksBody;

/// GET /drinks - Public menu, ingredient names withheld
pub async fn get(State(state): State<AppState>) -> ApiResult<DrinksBody<Vec<ShortDrink>>> {
    let drinks = state.store.list().await?;
    if drinks.is_empty() {
        return Err(ApiError::not_found());
    }

    let drinks = drinks.iter().map(|d| d.short()).collect();
    Ok(ApiResponse::success(DrinksBody { drinks }))
}
