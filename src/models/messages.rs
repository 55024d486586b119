use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Identity;

/// Messages a client may send over the board socket.
///
/// Any identity carried in a frame is ignored; the identity pinned at
/// upgrade time is authoritative for the whole connection.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join")]
    Join {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<Identity>,
    },
    #[serde(rename = "leave")]
    Leave {},
    #[serde(rename = "editing:start")]
    EditingStart {
        #[serde(rename = "taskId")]
        task_id: String,
    },
    #[serde(rename = "editing:stop")]
    EditingStop {
        #[serde(rename = "taskId")]
        task_id: String,
    },
    #[serde(rename = "typing:start")]
    TypingStart {
        #[serde(rename = "taskId")]
        task_id: String,
    },
    #[serde(rename = "typing:stop")]
    TypingStop {
        #[serde(rename = "taskId")]
        task_id: String,
    },
    #[serde(rename = "ping")]
    Ping {},
}

/// Whether a notice announces an arrival or a departure
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Join,
    Leave,
}

/// Messages the room sends to connected clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "presence")]
    Presence { users: Vec<Identity> },
    #[serde(rename = "notice")]
    Notice { notice: NoticeKind, user: Identity },
    #[serde(rename = "editing")]
    Editing {
        #[serde(rename = "taskId")]
        task_id: String,
        user: Identity,
        active: bool,
    },
    #[serde(rename = "typing")]
    Typing {
        #[serde(rename = "taskId")]
        task_id: String,
        user: Identity,
        active: bool,
    },
    #[serde(rename = "task:created")]
    TaskCreated {
        #[serde(rename = "taskId")]
        task_id: String,
        payload: Value,
        user: Identity,
    },
    #[serde(rename = "task:updated")]
    TaskUpdated {
        #[serde(rename = "taskId")]
        task_id: String,
        payload: Value,
        user: Identity,
    },
    #[serde(rename = "task:deleted")]
    TaskDeleted {
        #[serde(rename = "taskId")]
        task_id: String,
        payload: Value,
        user: Identity,
    },
    #[serde(rename = "comment:created")]
    CommentCreated {
        #[serde(rename = "taskId")]
        task_id: String,
        payload: Value,
        user: Identity,
    },
    #[serde(rename = "reaction:added")]
    ReactionAdded {
        #[serde(rename = "taskId")]
        task_id: String,
        payload: Value,
        user: Identity,
    },
    #[serde(rename = "reaction:removed")]
    ReactionRemoved {
        #[serde(rename = "taskId")]
        task_id: String,
        payload: Value,
        user: Identity,
    },
    #[serde(rename = "pong")]
    Pong { date: String },
}

/// Kinds of persisted mutations the relay can announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    CommentCreated,
    ReactionAdded,
    ReactionRemoved,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MutationKind::TaskCreated => "task:created",
            MutationKind::TaskUpdated => "task:updated",
            MutationKind::TaskDeleted => "task:deleted",
            MutationKind::CommentCreated => "comment:created",
            MutationKind::ReactionAdded => "reaction:added",
            MutationKind::ReactionRemoved => "reaction:removed",
        };
        write!(f, "{}", name)
    }
}
