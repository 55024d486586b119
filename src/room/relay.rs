use serde_json::Value;
use tracing::error;
use uuid::Uuid;

use crate::models::{Identity, MutationKind, ServerMessage};
use crate::room::room::{RoomCommand, RoomHandle};

/// Translates a successful persisted write into a room-wide notification.
///
/// Handlers call `publish` strictly after their write commits; clients must
/// never observe a mutation event for data that is not yet durably readable.
/// The payload passes through untouched beyond attaching the acting
/// identity, and any delivery failure is logged and swallowed here - a lost
/// broadcast must never fail the HTTP request that carried the write.
#[derive(Clone)]
pub struct MutationRelay {
    room: RoomHandle,
}

impl MutationRelay {
    pub fn new(room: RoomHandle) -> Self {
        Self { room }
    }

    pub fn publish(&self, kind: MutationKind, subject_id: Uuid, payload: Value, acting: Identity) {
        let task_id = subject_id.to_string();
        let event = match kind {
            MutationKind::TaskCreated => ServerMessage::TaskCreated {
                task_id,
                payload,
                user: acting,
            },
            MutationKind::TaskUpdated => ServerMessage::TaskUpdated {
                task_id,
                payload,
                user: acting,
            },
            MutationKind::TaskDeleted => ServerMessage::TaskDeleted {
                task_id,
                payload,
                user: acting,
            },
            MutationKind::CommentCreated => ServerMessage::CommentCreated {
                task_id,
                payload,
                user: acting,
            },
            MutationKind::ReactionAdded => ServerMessage::ReactionAdded {
                task_id,
                payload,
                user: acting,
            },
            MutationKind::ReactionRemoved => ServerMessage::ReactionRemoved {
                task_id,
                payload,
                user: acting,
            },
        };
        if !self.room.send(RoomCommand::Publish { event }) {
            error!("Failed to publish {} for {}", kind, subject_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::broadcaster::CONNECTION_BUFFER_SIZE;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn identity(name: &str) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    #[tokio::test]
    async fn publish_reaches_connected_observers_in_call_order() {
        let handle = crate::room::room::spawn(Duration::from_secs(10));
        let relay = MutationRelay::new(handle.clone());

        let observer = identity("Bob");
        let conn_id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(CONNECTION_BUFFER_SIZE);
        handle.join(conn_id, observer, tx);

        let actor = identity("Alice");
        let task = Uuid::new_v4();
        relay.publish(MutationKind::ReactionAdded, task, json!({"emoji": "👍"}), actor.clone());
        relay.publish(MutationKind::ReactionRemoved, task, json!({"emoji": "👍"}), actor.clone());

        // Drain until both mutation events arrive; join artifacts come first.
        let mut mutations = Vec::new();
        while mutations.len() < 2 {
            let text = rx.recv().await.expect("room alive");
            let message: ServerMessage = serde_json::from_str(&text).unwrap();
            match message {
                ServerMessage::ReactionAdded { .. } | ServerMessage::ReactionRemoved { .. } => {
                    mutations.push(message)
                }
                _ => {}
            }
        }
        assert!(matches!(mutations[0], ServerMessage::ReactionAdded { .. }));
        assert!(matches!(mutations[1], ServerMessage::ReactionRemoved { .. }));
    }

    #[test]
    fn publish_with_no_room_task_is_swallowed() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let relay = MutationRelay::new(RoomHandle::from_sender(tx));
        // Must not panic or error out to the caller.
        relay.publish(
            MutationKind::TaskCreated,
            Uuid::new_v4(),
            json!({"title": "orphaned"}),
            identity("Alice"),
        );
    }
}
