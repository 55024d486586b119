use crate::models::*;
use utoipa::OpenApi;
use uuid::Uuid;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Create an account
#[utoipa::path(
    post,
    path = "/api/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn signup_doc() {}

/// Exchange credentials for a token
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn login_doc() {}

/// List the caller's private tasks
#[utoipa::path(
    get,
    path = "/api/tasks",
    responses(
        (status = 200, description = "The caller's tasks, newest first", body = [TaskModel]),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[allow(dead_code)]
pub async fn list_tasks_doc() {}

/// Create a private task
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskModel),
        (status = 400, description = "Missing title", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn create_task_doc() {}

/// Update a private task
#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}",
    request_body = UpdateTaskRequest,
    params(("task_id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task updated", body = TaskModel),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn update_task_doc() {}

/// Delete a private task
#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    params(("task_id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn delete_task_doc() {}

/// List community board tasks
#[utoipa::path(
    get,
    path = "/api/community/tasks",
    responses(
        (status = 200, description = "All board tasks, newest first", body = [TaskModel])
    )
)]
#[allow(dead_code)]
pub async fn list_board_tasks_doc() {}

/// Create a community board task
#[utoipa::path(
    post,
    path = "/api/community/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created and announced to the room", body = TaskModel)
    )
)]
#[allow(dead_code)]
pub async fn create_board_task_doc() {}

/// Update a community board task (author only)
#[utoipa::path(
    put,
    path = "/api/community/tasks/{task_id}",
    request_body = UpdateTaskRequest,
    params(("task_id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task updated and announced", body = TaskModel),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn update_board_task_doc() {}

/// Delete a community board task (author only)
#[utoipa::path(
    delete,
    path = "/api/community/tasks/{task_id}",
    params(("task_id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted and announced"),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn delete_board_task_doc() {}

/// List comments on a board task
#[utoipa::path(
    get,
    path = "/api/community/tasks/{task_id}/comments",
    params(("task_id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Comments, newest first", body = [CommentModel]),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn list_board_comments_doc() {}

/// Comment on a board task
#[utoipa::path(
    post,
    path = "/api/community/tasks/{task_id}/comments",
    request_body = CreateCommentRequest,
    params(("task_id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 201, description = "Comment created and announced", body = CommentModel),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn create_board_comment_doc() {}

/// React to a board task
#[utoipa::path(
    put,
    path = "/api/community/tasks/{task_id}/reactions",
    request_body = ReactionRequest,
    params(("task_id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 204, description = "Reaction recorded; announced if new"),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn add_board_reaction_doc() {}

/// Withdraw a reaction from a board task
#[utoipa::path(
    delete,
    path = "/api/community/tasks/{task_id}/reactions",
    request_body = ReactionRequest,
    params(("task_id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 204, description = "Reaction removed; announced if it existed")
    )
)]
#[allow(dead_code)]
pub async fn remove_board_reaction_doc() {}

/// Room and process diagnostics
#[utoipa::path(
    get,
    path = "/api/diagnostics",
    responses(
        (status = 200, description = "Room and process statistics", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        signup_doc,
        login_doc,
        list_tasks_doc,
        create_task_doc,
        update_task_doc,
        delete_task_doc,
        list_board_tasks_doc,
        create_board_task_doc,
        update_board_task_doc,
        delete_board_task_doc,
        list_board_comments_doc,
        create_board_comment_doc,
        add_board_reaction_doc,
        remove_board_reaction_doc,
        diagnostics_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            SignupRequest,
            SignupResponse,
            LoginRequest,
            LoginResponse,
            Identity,
            TaskModel,
            TaskStatus,
            ReactionModel,
            CommentModel,
            CreateTaskRequest,
            UpdateTaskRequest,
            CreateCommentRequest,
            ReactionRequest,
            DiagnosticsResponse,
        )
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
