use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{
    add_board_reaction, create_board_comment, create_board_task, create_task, delete_board_task,
    delete_task, diagnostics, health_check, list_board_comments, list_board_tasks, list_tasks, login,
    ready_check, remove_board_reaction, signup, update_board_task, update_task,
};
use crate::routes::auth_middleware::auth_middleware;
use crate::AppState;

/// Create API routes
pub fn create_api_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:task_id", put(update_task).delete(delete_task))
        .route("/community/tasks", get(list_board_tasks).post(create_board_task))
        .route(
            "/community/tasks/:task_id",
            put(update_board_task).delete(delete_board_task),
        )
        .route(
            "/community/tasks/:task_id/comments",
            get(list_board_comments).post(create_board_comment),
        )
        .route(
            "/community/tasks/:task_id/reactions",
            put(add_board_reaction).delete(remove_board_reaction),
        )
        .route("/diagnostics", get(diagnostics))
        .route_layer(middleware::from_fn(auth_middleware)); // Applies to all routes added above

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .merge(protected)
        .with_state(state)
}
