use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, warn};

use crate::models::ServerMessage;
use crate::room::registry::{ConnId, SessionRegistry};

/// Per-connection outbound queue length. A destination that falls this far
/// behind is treated as already gone.
pub const CONNECTION_BUFFER_SIZE: usize = 64;

/// Fans named events out to every connection in the registry's roster.
///
/// Delivery is best-effort and non-blocking per destination: each send is an
/// independent `try_send` whose failure is logged locally and never surfaces
/// to the caller. Per destination, frames arrive in broadcast order (each
/// connection drains its own FIFO queue); there is no ordering guarantee
/// across destinations, no ack and no retry.
pub struct RoomBroadcaster;

impl RoomBroadcaster {
    pub fn new() -> Self {
        Self
    }

    /// Deliver `event` to every live connection except `exclude`.
    ///
    /// Returns the connections whose queues were closed or full; the caller
    /// must run the disconnect path for them since their cleanup may never
    /// arrive on its own.
    pub fn broadcast(
        &self,
        registry: &SessionRegistry,
        event: &ServerMessage,
        exclude: Option<ConnId>,
    ) -> Vec<ConnId> {
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize broadcast event: {}", e);
                return Vec::new();
            }
        };

        let mut dead = Vec::new();
        for (conn_id, conn) in registry.iter() {
            if Some(*conn_id) == exclude {
                continue;
            }
            match conn.tx.try_send(text.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!("Connection {} outbound queue full, dropping it", conn_id);
                    dead.push(*conn_id);
                }
                Err(TrySendError::Closed(_)) => {
                    warn!("Connection {} outbound queue closed, dropping it", conn_id);
                    dead.push(*conn_id);
                }
            }
        }
        dead
    }
}

impl Default for RoomBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Identity, NoticeKind};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn identity(name: &str) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn notice(user: &Identity, kind: NoticeKind) -> ServerMessage {
        ServerMessage::Notice {
            notice: kind,
            user: user.clone(),
        }
    }

    #[test]
    fn delivers_in_fifo_order_per_destination() {
        let mut reg = SessionRegistry::new();
        let user = identity("Alice");
        let conn = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(CONNECTION_BUFFER_SIZE);
        reg.join(conn, user.clone(), tx);

        let bc = RoomBroadcaster::new();
        bc.broadcast(&reg, &notice(&user, NoticeKind::Join), None);
        bc.broadcast(&reg, &notice(&user, NoticeKind::Leave), None);

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert!(first.contains("\"join\""));
        assert!(second.contains("\"leave\""));
    }

    #[test]
    fn excluded_connection_receives_nothing() {
        let mut reg = SessionRegistry::new();
        let user = identity("Alice");
        let excluded = Uuid::new_v4();
        let other = Uuid::new_v4();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        reg.join(excluded, user.clone(), tx_a);
        reg.join(other, identity("Bob"), tx_b);

        let dead = RoomBroadcaster::new().broadcast(&reg, &notice(&user, NoticeKind::Join), Some(excluded));
        assert!(dead.is_empty());
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn closed_destination_is_reported_without_failing_others() {
        let mut reg = SessionRegistry::new();
        let gone = Uuid::new_v4();
        let alive = Uuid::new_v4();
        let (tx_gone, rx_gone) = mpsc::channel(8);
        drop(rx_gone);
        let (tx_alive, mut rx_alive) = mpsc::channel(8);
        reg.join(gone, identity("Ghost"), tx_gone);
        reg.join(alive, identity("Alice"), tx_alive);

        let user = identity("Carol");
        let dead = RoomBroadcaster::new().broadcast(&reg, &notice(&user, NoticeKind::Join), None);
        assert_eq!(dead, vec![gone]);
        assert!(rx_alive.try_recv().is_ok());
    }

    #[test]
    fn full_destination_is_reported() {
        let mut reg = SessionRegistry::new();
        let slow = Uuid::new_v4();
        let (tx, _rx) = mpsc::channel(1);
        reg.join(slow, identity("Slow"), tx);

        let user = identity("Carol");
        let bc = RoomBroadcaster::new();
        assert!(bc.broadcast(&reg, &notice(&user, NoticeKind::Join), None).is_empty());
        // Queue of one is now full; the next frame marks the destination dead.
        assert_eq!(bc.broadcast(&reg, &notice(&user, NoticeKind::Leave), None), vec![slow]);
    }
}
