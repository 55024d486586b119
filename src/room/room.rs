use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::models::{Identity, ServerMessage};
use crate::room::broadcaster::RoomBroadcaster;
use crate::room::indicators::{indicator_message, IndicatorSet, IndicatorTracker};
use crate::room::presence;
use crate::room::registry::{ConnId, SessionRegistry};

/// How often the room checks indicator entries for expiry.
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Everything that can happen to the room. Each command is handled to
/// completion, including its broadcasts, before the next one is taken.
pub enum RoomCommand {
    Join {
        conn_id: ConnId,
        identity: Identity,
        tx: mpsc::Sender<String>,
    },
    /// Explicit leave and transport disconnect share this command; it is
    /// idempotent per connection.
    Leave { conn_id: ConnId },
    Raise {
        conn_id: ConnId,
        set: IndicatorSet,
        task_id: String,
    },
    Lower {
        conn_id: ConnId,
        set: IndicatorSet,
        task_id: String,
    },
    /// A pre-shaped mutation event from the relay.
    Publish { event: ServerMessage },
    Stats { reply: oneshot::Sender<RoomStats> },
}

/// Point-in-time counters for the diagnostics endpoint.
#[derive(Debug, Clone, Copy)]
pub struct RoomStats {
    pub connections: u32,
    pub participants: u32,
    pub editing: u32,
    pub typing: u32,
}

/// The single community room. Owns the registry and both indicator sets;
/// nothing outside the room task ever touches them.
pub struct Room {
    registry: SessionRegistry,
    broadcaster: RoomBroadcaster,
    indicators: IndicatorTracker,
}

impl Room {
    pub fn new(indicator_ttl: Duration) -> Self {
        Self {
            registry: SessionRegistry::new(),
            broadcaster: RoomBroadcaster::new(),
            indicators: IndicatorTracker::new(indicator_ttl),
        }
    }

    pub fn handle(&mut self, command: RoomCommand) {
        let dead = match command {
            RoomCommand::Join { conn_id, identity, tx } => presence::apply_join(
                &mut self.registry,
                &self.broadcaster,
                &mut self.indicators,
                conn_id,
                identity,
                tx,
            ),
            RoomCommand::Leave { conn_id } => presence::apply_leave(
                &mut self.registry,
                &self.broadcaster,
                &mut self.indicators,
                conn_id,
            ),
            RoomCommand::Raise { conn_id, set, task_id } => self.handle_raise(conn_id, set, task_id),
            RoomCommand::Lower { conn_id, set, task_id } => self.handle_lower(conn_id, set, task_id),
            RoomCommand::Publish { event } => self.broadcaster.broadcast(&self.registry, &event, None),
            RoomCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
                Vec::new()
            }
        };
        self.reap(dead);
    }

    /// Expire stale indicator entries. Runs as a normal room event from the
    /// room task's own timer.
    pub fn handle_sweep(&mut self) {
        let mut dead = Vec::new();
        for (set, task_id, identity) in self.indicators.sweep(Instant::now()) {
            debug!("Indicator {}:{} for {} expired", set.as_str(), task_id, identity.email);
            let lowered = indicator_message(set, &task_id, &identity, false);
            dead.extend(self.broadcaster.broadcast(&self.registry, &lowered, None));
        }
        self.reap(dead);
    }

    fn handle_raise(&mut self, conn_id: ConnId, set: IndicatorSet, task_id: String) -> Vec<ConnId> {
        let identity = match self.signaler(conn_id, &task_id) {
            Some(identity) => identity,
            None => return Vec::new(),
        };
        if !self.indicators.raise(set, &task_id, &identity, Instant::now()) {
            // Already active: the expiry clock was re-armed, nothing to say.
            return Vec::new();
        }
        let event = indicator_message(set, &task_id, &identity, true);
        self.broadcaster.broadcast(&self.registry, &event, Self::exclusion(set, conn_id))
    }

    fn handle_lower(&mut self, conn_id: ConnId, set: IndicatorSet, task_id: String) -> Vec<ConnId> {
        let identity = match self.signaler(conn_id, &task_id) {
            Some(identity) => identity,
            None => return Vec::new(),
        };
        if self.indicators.lower(set, &task_id, identity.id).is_none() {
            return Vec::new();
        }
        let event = indicator_message(set, &task_id, &identity, false);
        self.broadcaster.broadcast(&self.registry, &event, Self::exclusion(set, conn_id))
    }

    /// Resolve the identity behind an indicator signal. Signals from
    /// connections that never joined, or without a subject, are malformed
    /// and dropped without side effect.
    fn signaler(&self, conn_id: ConnId, task_id: &str) -> Option<Identity> {
        if task_id.is_empty() {
            debug!("Dropping indicator signal without a task id from {}", conn_id);
            return None;
        }
        match self.registry.get(conn_id) {
            Some(connection) => Some(connection.identity.clone()),
            None => {
                debug!("Dropping indicator signal from unjoined connection {}", conn_id);
                None
            }
        }
    }

    /// Typing signals must not echo to their originator; editing signals
    /// reach the raiser's own other tabs too.
    fn exclusion(set: IndicatorSet, conn_id: ConnId) -> Option<ConnId> {
        match set {
            IndicatorSet::Typing => Some(conn_id),
            IndicatorSet::Editing => None,
        }
    }

    /// Force the disconnect path for destinations whose queues failed.
    /// Their broadcasts may in turn uncover more dead destinations.
    fn reap(&mut self, mut dead: Vec<ConnId>) {
        while let Some(conn_id) = dead.pop() {
            let more = presence::apply_leave(
                &mut self.registry,
                &self.broadcaster,
                &mut self.indicators,
                conn_id,
            );
            dead.extend(more);
        }
    }

    pub fn stats(&self) -> RoomStats {
        RoomStats {
            connections: self.registry.len() as u32,
            participants: self.registry.active_identities().len() as u32,
            editing: self.indicators.count(IndicatorSet::Editing) as u32,
            typing: self.indicators.count(IndicatorSet::Typing) as u32,
        }
    }
}

/// Cloneable handle for feeding events into the room task.
#[derive(Clone)]
pub struct RoomHandle {
    tx: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    #[cfg(test)]
    pub(crate) fn from_sender(tx: mpsc::UnboundedSender<RoomCommand>) -> Self {
        Self { tx }
    }

    /// Enqueue a command. Returns false when the room task is gone; callers
    /// treat that as a swallowed delivery failure.
    pub fn send(&self, command: RoomCommand) -> bool {
        if self.tx.send(command).is_err() {
            warn!("Room task is not running, command dropped");
            return false;
        }
        true
    }

    pub fn join(&self, conn_id: ConnId, identity: Identity, tx: mpsc::Sender<String>) {
        self.send(RoomCommand::Join { conn_id, identity, tx });
    }

    pub fn leave(&self, conn_id: ConnId) {
        self.send(RoomCommand::Leave { conn_id });
    }

    pub fn raise(&self, conn_id: ConnId, set: IndicatorSet, task_id: String) {
        self.send(RoomCommand::Raise { conn_id, set, task_id });
    }

    pub fn lower(&self, conn_id: ConnId, set: IndicatorSet, task_id: String) {
        self.send(RoomCommand::Lower { conn_id, set, task_id });
    }

    /// Ask the room task for its current counters.
    pub async fn stats(&self) -> Option<RoomStats> {
        let (reply, rx) = oneshot::channel();
        if !self.send(RoomCommand::Stats { reply }) {
            return None;
        }
        rx.await.ok()
    }
}

/// Spawn the room task: a single loop that owns all room state and applies
/// one command at a time. The indicator sweep ticks inside the same loop, so
/// expiry is serialized with every other mutation.
pub fn spawn(indicator_ttl: Duration) -> RoomHandle {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut room = Room::new(indicator_ttl);
        let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("Community room task started");
        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(command) => room.handle(command),
                    None => break,
                },
                _ = sweep.tick() => room.handle_sweep(),
            }
        }
        info!("Community room task stopped");
    });
    RoomHandle { tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoticeKind;
    use crate::room::broadcaster::CONNECTION_BUFFER_SIZE;
    use serde_json::json;
    use uuid::Uuid;

    fn identity(name: &str) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn join(room: &mut Room, identity: &Identity) -> (ConnId, mpsc::Receiver<String>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER_SIZE);
        room.handle(RoomCommand::Join {
            conn_id,
            identity: identity.clone(),
            tx,
        });
        (conn_id, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(text) = rx.try_recv() {
            messages.push(serde_json::from_str(&text).unwrap());
        }
        messages
    }

    #[test]
    fn typing_does_not_echo_to_its_originator() {
        let mut room = Room::new(Duration::from_secs(10));
        let alice = identity("Alice");
        let bob = identity("Bob");
        let (alice_conn, mut alice_rx) = join(&mut room, &alice);
        let (_bob_conn, mut bob_rx) = join(&mut room, &bob);
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        room.handle(RoomCommand::Raise {
            conn_id: alice_conn,
            set: IndicatorSet::Typing,
            task_id: "task-1".into(),
        });

        assert!(drain(&mut alice_rx).is_empty());
        let seen = drain(&mut bob_rx);
        assert!(matches!(
            seen.as_slice(),
            [ServerMessage::Typing { task_id, user, active: true }] if task_id == "task-1" && user.id == alice.id
        ));
    }

    #[test]
    fn editing_reaches_the_raisers_other_tabs() {
        let mut room = Room::new(Duration::from_secs(10));
        let alice = identity("Alice");
        let (tab_a, mut rx_a) = join(&mut room, &alice);
        let (_tab_b, mut rx_b) = join(&mut room, &alice);
        drain(&mut rx_a);
        drain(&mut rx_b);

        room.handle(RoomCommand::Raise {
            conn_id: tab_a,
            set: IndicatorSet::Editing,
            task_id: "task-1".into(),
        });

        assert_eq!(drain(&mut rx_a).len(), 1);
        assert_eq!(drain(&mut rx_b).len(), 1);
    }

    #[test]
    fn duplicate_raise_broadcasts_nothing() {
        let mut room = Room::new(Duration::from_secs(10));
        let alice = identity("Alice");
        let bob = identity("Bob");
        let (alice_conn, _alice_rx) = join(&mut room, &alice);
        let (_bob_conn, mut bob_rx) = join(&mut room, &bob);
        drain(&mut bob_rx);

        for _ in 0..2 {
            room.handle(RoomCommand::Raise {
                conn_id: alice_conn,
                set: IndicatorSet::Typing,
                task_id: "task-1".into(),
            });
        }

        assert_eq!(drain(&mut bob_rx).len(), 1);
    }

    #[test]
    fn lower_without_raise_broadcasts_nothing() {
        let mut room = Room::new(Duration::from_secs(10));
        let alice = identity("Alice");
        let bob = identity("Bob");
        let (alice_conn, _alice_rx) = join(&mut room, &alice);
        let (_bob_conn, mut bob_rx) = join(&mut room, &bob);
        drain(&mut bob_rx);

        room.handle(RoomCommand::Lower {
            conn_id: alice_conn,
            set: IndicatorSet::Editing,
            task_id: "task-1".into(),
        });

        assert!(drain(&mut bob_rx).is_empty());
    }

    #[test]
    fn signals_from_unjoined_connections_are_dropped() {
        let mut room = Room::new(Duration::from_secs(10));
        let bob = identity("Bob");
        let (_bob_conn, mut bob_rx) = join(&mut room, &bob);
        drain(&mut bob_rx);

        room.handle(RoomCommand::Raise {
            conn_id: Uuid::new_v4(),
            set: IndicatorSet::Typing,
            task_id: "task-1".into(),
        });

        assert!(drain(&mut bob_rx).is_empty());
        assert_eq!(room.stats().typing, 0);
    }

    #[test]
    fn sequential_publishes_arrive_in_order() {
        let mut room = Room::new(Duration::from_secs(10));
        let alice = identity("Alice");
        let observer = identity("Bob");
        let (_conn, mut rx) = join(&mut room, &observer);
        drain(&mut rx);

        let task_id = Uuid::new_v4().to_string();
        room.handle(RoomCommand::Publish {
            event: ServerMessage::ReactionAdded {
                task_id: task_id.clone(),
                payload: json!({"emoji": "🎉"}),
                user: alice.clone(),
            },
        });
        room.handle(RoomCommand::Publish {
            event: ServerMessage::ReactionRemoved {
                task_id: task_id.clone(),
                payload: json!({"emoji": "🎉"}),
                user: alice.clone(),
            },
        });

        let seen = drain(&mut rx);
        assert!(matches!(
            seen.as_slice(),
            [ServerMessage::ReactionAdded { .. }, ServerMessage::ReactionRemoved { .. }]
        ));
    }

    #[test]
    fn dead_destinations_are_reaped_through_the_leave_path() {
        let mut room = Room::new(Duration::from_secs(10));
        let alice = identity("Alice");
        let bob = identity("Bob");

        let gone_conn = Uuid::new_v4();
        let (gone_tx, gone_rx) = mpsc::channel(CONNECTION_BUFFER_SIZE);
        room.handle(RoomCommand::Join {
            conn_id: gone_conn,
            identity: alice.clone(),
            tx: gone_tx,
        });
        let (_bob_conn, mut bob_rx) = join(&mut room, &bob);
        drain(&mut bob_rx);

        // The transport for alice dies without a disconnect callback.
        drop(gone_rx);
        room.handle(RoomCommand::Publish {
            event: ServerMessage::TaskDeleted {
                task_id: "task-1".into(),
                payload: serde_json::Value::Null,
                user: bob.clone(),
            },
        });

        assert_eq!(room.stats().connections, 1);
        let messages = drain(&mut bob_rx);
        assert!(messages.iter().any(|m| matches!(
            m,
            ServerMessage::Notice { notice: NoticeKind::Leave, user } if user.id == alice.id
        )));
    }

    #[tokio::test]
    async fn room_task_serializes_commands_and_answers_stats() {
        let handle = spawn(Duration::from_secs(10));
        let alice = identity("Alice");
        let conn_id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(CONNECTION_BUFFER_SIZE);

        handle.join(conn_id, alice.clone(), tx);
        handle.raise(conn_id, IndicatorSet::Editing, "task-1".into());

        let stats = handle.stats().await.expect("room task alive");
        assert_eq!(stats.connections, 1);
        assert_eq!(stats.participants, 1);
        assert_eq!(stats.editing, 1);

        // The commands above were applied in order: snapshot, join notice,
        // then the editing indicator.
        let mut seen = Vec::new();
        while let Ok(text) = rx.try_recv() {
            seen.push(serde_json::from_str::<ServerMessage>(&text).unwrap());
        }
        assert!(matches!(seen[0], ServerMessage::Presence { .. }));
        assert!(matches!(
            seen.last(),
            Some(ServerMessage::Editing { active: true, .. })
        ));

        handle.leave(conn_id);
        let stats = handle.stats().await.expect("room task alive");
        assert_eq!(stats.connections, 0);
        assert_eq!(stats.editing, 0);
    }
}
