use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Identity;

/// Workflow state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TaskStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(TaskStatus::Pending),
            "In Progress" => Some(TaskStatus::InProgress),
            "Completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// A single emoji reaction on a board task
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReactionModel {
    pub user: Uuid,
    pub emoji: String,
}

/// A task as returned by the API, with its author and reactions resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskModel {
    pub id: Uuid,
    pub user: Identity,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub reactions: Vec<ReactionModel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment on a board task
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentModel {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user: Identity,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a task
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Request body for a partial task update
#[derive(Serialize, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Request body for adding a comment
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    pub text: String,
}

/// Request body for adding or removing a reaction
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ReactionRequest {
    pub emoji: String,
}
