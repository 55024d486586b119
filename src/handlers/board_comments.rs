use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::db::dbtasks::TaskBoard;
use crate::handlers::{internal_error, require_db, to_payload};
use crate::models::{CommentModel, CreateCommentRequest, ErrorResponse, Identity, MutationKind};
use crate::AppState;

/// List comments on a community task, newest first
pub async fn list_board_comments(
    Extension(_user): Extension<Identity>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<CommentModel>>, (StatusCode, Json<ErrorResponse>)> {
    let db = require_db()?;
    db.get_task(TaskBoard::Community, task_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| ErrorResponse::with_status(StatusCode::NOT_FOUND, "Task not found"))?;

    let comments = db
        .list_comments(task_id)
        .await
        .map_err(internal_error)?
        .into_iter()
        .map(|row| row.into_model())
        .collect();
    Ok(Json(comments))
}

/// Comment on a community task and announce it to the room
pub async fn create_board_comment(
    State(state): State<AppState>,
    Extension(user): Extension<Identity>,
    Path(task_id): Path<Uuid>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentModel>), (StatusCode, Json<ErrorResponse>)> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ErrorResponse::with_status(StatusCode::BAD_REQUEST, "text is required"));
    }

    let db = require_db()?;
    db.get_task(TaskBoard::Community, task_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| ErrorResponse::with_status(StatusCode::NOT_FOUND, "Task not found"))?;

    let comment = db
        .create_comment(task_id, user.id, text)
        .await
        .map_err(internal_error)?
        .into_model();

    state
        .relay
        .publish(MutationKind::CommentCreated, task_id, to_payload(&comment), user);
    Ok((StatusCode::CREATED, Json(comment)))
}
