use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::db::dbtasks::TaskBoard;
use crate::handlers::{internal_error, require_db};
use crate::models::{CreateTaskRequest, ErrorResponse, Identity, TaskModel, UpdateTaskRequest};

/// List the caller's private tasks, newest first
pub async fn list_tasks(
    Extension(user): Extension<Identity>,
) -> Result<Json<Vec<TaskModel>>, (StatusCode, Json<ErrorResponse>)> {
    let db = require_db()?;
    let rows = db
        .list_tasks(TaskBoard::Private, Some(user.id))
        .await
        .map_err(internal_error)?;
    let tasks = rows.into_iter().map(|row| row.into_model(Vec::new())).collect();
    Ok(Json(tasks))
}

/// Create a private task
pub async fn create_task(
    Extension(user): Extension<Identity>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskModel>), (StatusCode, Json<ErrorResponse>)> {
    if request.title.trim().is_empty() {
        return Err(ErrorResponse::with_status(StatusCode::BAD_REQUEST, "title is required"));
    }

    let db = require_db()?;
    let row = db
        .create_task(
            TaskBoard::Private,
            user.id,
            request.title.trim(),
            request.description.as_deref().unwrap_or(""),
            request.status.unwrap_or_default(),
        )
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(row.into_model(Vec::new()))))
}

/// Partially update one of the caller's private tasks
pub async fn update_task(
    Extension(user): Extension<Identity>,
    Path(task_id): Path<Uuid>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<TaskModel>, (StatusCode, Json<ErrorResponse>)> {
    let db = require_db()?;
    let row = db
        .update_task(
            TaskBoard::Private,
            user.id,
            task_id,
            request.title.as_deref(),
            request.description.as_deref(),
            request.status,
        )
        .await
        .map_err(internal_error)?;

    match row {
        Some(row) => Ok(Json(row.into_model(Vec::new()))),
        None => Err(ErrorResponse::with_status(StatusCode::NOT_FOUND, "Task not found")),
    }
}

/// Delete one of the caller's private tasks
pub async fn delete_task(
    Extension(user): Extension<Identity>,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let db = require_db()?;
    let deleted = db
        .delete_task(TaskBoard::Private, user.id, task_id)
        .await
        .map_err(internal_error)?;

    if !deleted {
        return Err(ErrorResponse::with_status(StatusCode::NOT_FOUND, "Task not found"));
    }
    info!("Private task '{}' deleted by {}", task_id, user.email);
    Ok(StatusCode::NO_CONTENT)
}
