use axum::extract::{rejection::PathRejection, Path, State};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

use super::{drink_id, DeletedBody};

/// DELETE /drinks/:id
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<DeletedBody> {
    let id = drink_id(path)?;

    if !state.store.delete(id).await? {
        return Err(ApiError::not_found());
    }

    tracing::info!("Deleted drink {}", id);
    Ok(ApiResponse::success(DeletedBody { deleted: id }))
}
