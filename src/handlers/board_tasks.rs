use std::collections::HashMap;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::auth::ensure_author;
use crate::db::dbtasks::TaskBoard;
use crate::handlers::{internal_error, require_db, to_payload};
use crate::models::{
    CreateTaskRequest, ErrorResponse, Identity, MutationKind, ReactionModel, TaskModel, UpdateTaskRequest,
};
use crate::AppState;

/// List every task on the community board, newest first, with reactions
pub async fn list_board_tasks(
    Extension(_user): Extension<Identity>,
) -> Result<Json<Vec<TaskModel>>, (StatusCode, Json<ErrorResponse>)> {
    let db = require_db()?;
    let rows = db
        .list_tasks(TaskBoard::Community, None)
        .await
        .map_err(internal_error)?;

    let task_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut reactions: HashMap<Uuid, Vec<ReactionModel>> = HashMap::new();
    for row in db.reactions_for_tasks(&task_ids).await.map_err(internal_error)? {
        reactions.entry(row.task).or_default().push(ReactionModel {
            user: row.user_id,
            emoji: row.emoji,
        });
    }

    let tasks = rows
        .into_iter()
        .map(|row| {
            let task_reactions = reactions.remove(&row.id).unwrap_or_default();
            row.into_model(task_reactions)
        })
        .collect();
    Ok(Json(tasks))
}

/// Create a task on the community board and announce it to the room
pub async fn create_board_task(
    State(state): State<AppState>,
    Extension(user): Extension<Identity>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskModel>), (StatusCode, Json<ErrorResponse>)> {
    if request.title.trim().is_empty() {
        return Err(ErrorResponse::with_status(StatusCode::BAD_REQUEST, "title is required"));
    }

    let db = require_db()?;
    let row = db
        .create_task(
            TaskBoard::Community,
            user.id,
            request.title.trim(),
            request.description.as_deref().unwrap_or(""),
            request.status.unwrap_or_default(),
        )
        .await
        .map_err(internal_error)?;

    let task = row.into_model(Vec::new());
    // The write is committed; anything after this is best-effort fan-out.
    state
        .relay
        .publish(MutationKind::TaskCreated, task.id, to_payload(&task), user);
    Ok((StatusCode::CREATED, Json(task)))
}

/// Update a community task (author only) and announce the new state
pub async fn update_board_task(
    State(state): State<AppState>,
    Extension(user): Extension<Identity>,
    Path(task_id): Path<Uuid>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<TaskModel>, (StatusCode, Json<ErrorResponse>)> {
    let db = require_db()?;
    let existing = db
        .get_task(TaskBoard::Community, task_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| ErrorResponse::with_status(StatusCode::NOT_FOUND, "Task not found"))?;
    ensure_author(&user, &existing)?;

    let row = db
        .update_task(
            TaskBoard::Community,
            existing.owner,
            task_id,
            request.title.as_deref(),
            request.description.as_deref(),
            request.status,
        )
        .await
        .map_err(internal_error)?
        .ok_or_else(|| ErrorResponse::with_status(StatusCode::NOT_FOUND, "Task not found"))?;

    let reactions = db
        .reactions_for_tasks(&[task_id])
        .await
        .map_err(internal_error)?
        .into_iter()
        .map(|r| ReactionModel {
            user: r.user_id,
            emoji: r.emoji,
        })
        .collect();

    let task = row.into_model(reactions);
    state
        .relay
        .publish(MutationKind::TaskUpdated, task.id, to_payload(&task), user);
    Ok(Json(task))
}

/// Delete a community task (author only) and announce the removal
pub async fn delete_board_task(
    State(state): State<AppState>,
    Extension(user): Extension<Identity>,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let db = require_db()?;
    let existing = db
        .get_task(TaskBoard::Community, task_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| ErrorResponse::with_status(StatusCode::NOT_FOUND, "Task not found"))?;
    ensure_author(&user, &existing)?;

    let deleted = db
        .delete_task(TaskBoard::Community, existing.owner, task_id)
        .await
        .map_err(internal_error)?;
    if !deleted {
        return Err(ErrorResponse::with_status(StatusCode::NOT_FOUND, "Task not found"));
    }

    info!("Board task '{}' deleted by {}", task_id, user.email);
    state
        .relay
        .publish(MutationKind::TaskDeleted, task_id, serde_json::Value::Null, user);
    Ok(StatusCode::NO_CONTENT)
}
