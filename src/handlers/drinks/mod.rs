// handlers/drinks - CRUD over the drinks menu
//
// GET    /drinks          public, short projection
// GET    /drinks-detail   get:drinks-detail, long projection
// POST   /drinks          post:drinks
// PATCH  /drinks/:id      patch:drinks
// DELETE /drinks/:id      delete:drinks

pub mod create;
pub mod delete;
pub mod detail;
pub mod list;
pub mod update;

use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use serde::Serialize;

use crate::error::ApiError;

pub use create::post as create;
pub use delete::delete as remove;
pub use detail::get as detail;
pub use list::get as list;
pub use update::patch as update;

/// `{"drinks": ...}` payload; a list for reads, a single drink for writes
#[derive(Debug, Serialize)]
pub struct DrinksBody<T: Serialize> {
    pub drinks: T,
}

#[derive(Debug, Serialize)]
pub struct DeletedBody {
    pub deleted: i32,
}

/// A non-integer id can never name a drink
fn drink_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!("Invalid drink id: {}", rejection);
        ApiError::not_found()
    })
}
