use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::db::dbtasks::TaskBoard;
use crate::handlers::{internal_error, require_db};
use crate::models::{ErrorResponse, Identity, MutationKind, ReactionRequest};
use crate::AppState;

/// Add an emoji reaction to a community task. Re-adding the same reaction is
/// a no-op and publishes nothing.
pub async fn add_board_reaction(
    State(state): State<AppState>,
    Extension(user): Extension<Identity>,
    Path(task_id): Path<Uuid>,
    Json(request): Json<ReactionRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let emoji = request.emoji.trim();
    if emoji.is_empty() {
        return Err(ErrorResponse::with_status(StatusCode::BAD_REQUEST, "emoji is required"));
    }

    let db = require_db()?;
    db.get_task(TaskBoard::Community, task_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| ErrorResponse::with_status(StatusCode::NOT_FOUND, "Task not found"))?;

    let added = db
        .add_reaction(task_id, user.id, emoji)
        .await
        .map_err(internal_error)?;

    if added {
        state
            .relay
            .publish(MutationKind::ReactionAdded, task_id, json!({ "emoji": emoji }), user);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Remove one of the caller's reactions. Removing a reaction that is not
/// there is a no-op and publishes nothing.
pub async fn remove_board_reaction(
    State(state): State<AppState>,
    Extension(user): Extension<Identity>,
    Path(task_id): Path<Uuid>,
    Json(request): Json<ReactionRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let emoji = request.emoji.trim();
    if emoji.is_empty() {
        return Err(ErrorResponse::with_status(StatusCode::BAD_REQUEST, "emoji is required"));
    }

    let db = require_db()?;
    let removed = db
        .remove_reaction(task_id, user.id, emoji)
        .await
        .map_err(internal_error)?;

    if removed {
        state
            .relay
            .publish(MutationKind::ReactionRemoved, task_id, json!({ "emoji": emoji }), user);
    }
    Ok(StatusCode::NO_CONTENT)
}
