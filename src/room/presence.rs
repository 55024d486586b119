use tokio::sync::mpsc;
use tracing::info;

use crate::models::{Identity, NoticeKind, ServerMessage};
use crate::room::broadcaster::RoomBroadcaster;
use crate::room::indicators::{indicator_message, IndicatorTracker};
use crate::room::registry::{ConnId, SessionRegistry};

/// Keeps the room's idea of "who is here" synchronized with the connection
/// set and announces transitions.
///
/// Snapshots broadcast on every join and leave; join/leave notices fire once
/// per identity, not once per connection. Both functions return the
/// connections whose outbound queues failed mid-broadcast so the room task
/// can run the disconnect path for them.
pub(crate) fn apply_join(
    registry: &mut SessionRegistry,
    broadcaster: &RoomBroadcaster,
    indicators: &mut IndicatorTracker,
    conn_id: ConnId,
    identity: Identity,
    tx: mpsc::Sender<String>,
) -> Vec<ConnId> {
    let replaced = registry.join(conn_id, identity.clone(), tx);

    let snapshot = ServerMessage::Presence {
        users: registry.active_identities(),
    };
    let mut dead = broadcaster.broadcast(registry, &snapshot, None);

    // A re-join that swapped identities is a leave for the old identity.
    if let Some(old) = replaced {
        if old.id != identity.id && registry.connections_for(old.id) == 0 {
            dead.extend(settle_departed(registry, broadcaster, indicators, &old));
        }
    }

    if registry.connections_for(identity.id) == 1 {
        info!("{} joined the board", identity.email);
        let notice = ServerMessage::Notice {
            notice: NoticeKind::Join,
            user: identity,
        };
        dead.extend(broadcaster.broadcast(registry, &notice, None));
    }

    dead
}

/// Remove a connection and announce the result. Shared by explicit leaves,
/// transport disconnects and forced drops of unreachable destinations; a
/// connection already removed is a silent no-op.
pub(crate) fn apply_leave(
    registry: &mut SessionRegistry,
    broadcaster: &RoomBroadcaster,
    indicators: &mut IndicatorTracker,
    conn_id: ConnId,
) -> Vec<ConnId> {
    let removed = match registry.leave(conn_id) {
        Some(connection) => connection,
        None => return Vec::new(),
    };
    let identity = removed.identity;

    let snapshot = ServerMessage::Presence {
        users: registry.active_identities(),
    };
    let mut dead = broadcaster.broadcast(registry, &snapshot, None);

    if registry.connections_for(identity.id) == 0 {
        info!(
            "{} left the board after {}s",
            identity.email,
            (chrono::Utc::now() - removed.joined_at).num_seconds()
        );
        dead.extend(settle_departed(registry, broadcaster, indicators, &identity));
    }

    dead
}

/// An identity lost its last connection: clear its ghost indicators, then
/// announce the departure.
fn settle_departed(
    registry: &SessionRegistry,
    broadcaster: &RoomBroadcaster,
    indicators: &mut IndicatorTracker,
    identity: &Identity,
) -> Vec<ConnId> {
    let mut dead = Vec::new();
    for (set, task_id, ident) in indicators.clear_for_identity(identity.id) {
        let lowered = indicator_message(set, &task_id, &ident, false);
        dead.extend(broadcaster.broadcast(registry, &lowered, None));
    }
    let notice = ServerMessage::Notice {
        notice: NoticeKind::Leave,
        user: identity.clone(),
    };
    dead.extend(broadcaster.broadcast(registry, &notice, None));
    dead
}
