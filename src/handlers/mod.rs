use std::sync::Arc;

use axum::{http::StatusCode, Json};
use tracing::error;

use crate::db::dbtasks::{self, DbTasks};
use crate::models::ErrorResponse;

pub mod board_comments;
pub mod board_reactions;
pub mod board_tasks;
pub mod diagnostics;
pub mod health;
pub mod login;
pub mod signup;
pub mod tasks;

pub use board_comments::*;
pub use board_reactions::*;
pub use board_tasks::*;
pub use diagnostics::*;
pub use health::*;
pub use login::*;
pub use signup::*;
pub use tasks::*;

/// The database handle, or the 500 every handler returns without one.
pub(crate) fn require_db() -> Result<Arc<DbTasks>, (StatusCode, Json<ErrorResponse>)> {
    dbtasks::get_db().ok_or_else(|| {
        error!("Database not initialized");
        ErrorResponse::with_status(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })
}

/// Map a database error to an opaque 500.
pub(crate) fn internal_error(e: sqlx::Error) -> (StatusCode, Json<ErrorResponse>) {
    error!("Database error: {}", e);
    ErrorResponse::with_status(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Serialize a payload for the mutation relay; a failure becomes a null
/// payload rather than a failed request.
pub(crate) fn to_payload<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        error!("Failed to serialize mutation payload: {}", e);
        serde_json::Value::Null
    })
}
