use axum::extract::State;

use crate::app::AppState;
use crate::database::models::Drink;
use crate::middleware::{ApiResponse, ApiResult};

use super::DrinksBody;

/// GET /drinks-detail - Full recipes. An empty menu is still a 200.
pub async fn get(State(state): State<AppState>) -> ApiResult<DrinksBody<Vec<Drink>>> {
    let drinks = state.store.list().await?;
    Ok(ApiResponse::success(DrinksBody { drinks }))
}
