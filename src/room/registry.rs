use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::Identity;

/// Opaque id of one transport-level connection.
pub type ConnId = Uuid;

/// One live transport session on the board.
///
/// Created when the client joins, destroyed on leave or disconnect. The
/// identity is fixed for the connection's life (a re-join swaps the whole
/// value, it never mutates in place).
pub struct Connection {
    pub identity: Identity,
    pub joined_at: DateTime<Utc>,
    /// Monotonic join counter, orders the presence projection.
    seq: u64,
    /// Outbound frame queue for this connection.
    pub(crate) tx: mpsc::Sender<String>,
}

/// Maps active connections to the identities occupying them.
///
/// State lives for the process lifetime only and is scoped to the single
/// community room. Every mutation goes through the room task, so the
/// registry itself needs no locking.
#[derive(Default)]
pub struct SessionRegistry {
    connections: HashMap<ConnId, Connection>,
    next_seq: u64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection.
    ///
    /// If `conn_id` is already registered no new Connection is created; the
    /// stored identity (and sender) are replaced and the previous identity
    /// is returned so the caller can settle presence for it.
    pub fn join(
        &mut self,
        conn_id: ConnId,
        identity: Identity,
        tx: mpsc::Sender<String>,
    ) -> Option<Identity> {
        if let Some(existing) = self.connections.get_mut(&conn_id) {
            let old = std::mem::replace(&mut existing.identity, identity);
            existing.tx = tx;
            return Some(old);
        }
        self.next_seq += 1;
        self.connections.insert(
            conn_id,
            Connection {
                identity,
                joined_at: Utc::now(),
                seq: self.next_seq,
                tx,
            },
        );
        None
    }

    /// Remove a connection. Returns the removed Connection, or None if the
    /// id was not registered (already removed - idempotent).
    pub fn leave(&mut self, conn_id: ConnId) -> Option<Connection> {
        self.connections.remove(&conn_id)
    }

    /// The current distinct-identity projection of the live connection set,
    /// ordered by most recently joined connection first. Deterministic
    /// between mutations.
    pub fn active_identities(&self) -> Vec<Identity> {
        let mut conns: Vec<&Connection> = self.connections.values().collect();
        conns.sort_by(|a, b| b.seq.cmp(&a.seq));

        let mut seen = HashSet::new();
        let mut identities = Vec::new();
        for conn in conns {
            if seen.insert(conn.identity.id) {
                identities.push(conn.identity.clone());
            }
        }
        identities
    }

    /// Number of live connections held by an identity.
    pub fn connections_for(&self, user_id: Uuid) -> usize {
        self.connections
            .values()
            .filter(|c| c.identity.id == user_id)
            .count()
    }

    pub fn get(&self, conn_id: ConnId) -> Option<&Connection> {
        self.connections.get(&conn_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConnId, &Connection)> {
        self.connections.iter()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn sender() -> mpsc::Sender<String> {
        mpsc::channel(8).0
    }

    #[test]
    fn distinct_identity_projection() {
        let mut reg = SessionRegistry::new();
        let alice = identity("Alice");
        let tab_a = Uuid::new_v4();
        let tab_b = Uuid::new_v4();

        reg.join(tab_a, alice.clone(), sender());
        reg.join(tab_b, alice.clone(), sender());
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.active_identities(), vec![alice.clone()]);
        assert_eq!(reg.connections_for(alice.id), 2);

        // One tab leaving keeps the identity present.
        assert!(reg.leave(tab_a).is_some());
        assert_eq!(reg.active_identities(), vec![alice.clone()]);
        assert_eq!(reg.connections_for(alice.id), 1);

        // The last tab leaving removes it.
        assert!(reg.leave(tab_b).is_some());
        assert!(reg.active_identities().is_empty());
        assert_eq!(reg.connections_for(alice.id), 0);
    }

    #[test]
    fn leave_is_idempotent() {
        let mut reg = SessionRegistry::new();
        let conn = Uuid::new_v4();
        reg.join(conn, identity("Alice"), sender());
        assert!(reg.leave(conn).is_some());
        assert!(reg.leave(conn).is_none());
    }

    #[test]
    fn most_recent_join_orders_first() {
        let mut reg = SessionRegistry::new();
        let alice = identity("Alice");
        let bob = identity("Bob");
        reg.join(Uuid::new_v4(), alice.clone(), sender());
        reg.join(Uuid::new_v4(), bob.clone(), sender());

        assert_eq!(reg.active_identities(), vec![bob.clone(), alice.clone()]);
        // No intervening change: the projection is stable across calls.
        assert_eq!(reg.active_identities(), reg.active_identities());
    }

    #[test]
    fn rejoin_replaces_identity_without_new_connection() {
        let mut reg = SessionRegistry::new();
        let alice = identity("Alice");
        let bob = identity("Bob");
        let conn = Uuid::new_v4();

        assert!(reg.join(conn, alice.clone(), sender()).is_none());
        let replaced = reg.join(conn, bob.clone(), sender());
        assert_eq!(replaced, Some(alice.clone()));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.connections_for(alice.id), 0);
        assert_eq!(reg.connections_for(bob.id), 1);
    }
}
