use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::models::{Identity, ServerMessage};

/// One of the two independent ephemeral indicator tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorSet {
    /// "someone is editing this task"
    Editing,
    /// "someone is typing a comment on this task"
    Typing,
}

impl IndicatorSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorSet::Editing => "editing",
            IndicatorSet::Typing => "typing",
        }
    }
}

/// Build the wire event announcing an indicator transition.
pub fn indicator_message(set: IndicatorSet, task_id: &str, user: &Identity, active: bool) -> ServerMessage {
    match set {
        IndicatorSet::Editing => ServerMessage::Editing {
            task_id: task_id.to_string(),
            user: user.clone(),
            active,
        },
        IndicatorSet::Typing => ServerMessage::Typing {
            task_id: task_id.to_string(),
            user: user.clone(),
            active,
        },
    }
}

struct IndicatorEntry {
    identity: Identity,
    raised_at: Instant,
}

/// Transient "active signaler" state, keyed by (task id, user id).
///
/// At most one entry per (set, task, user): re-raising is idempotent and
/// only re-arms the entry's expiry clock. Entries are keyed by identity, not
/// connection, so switching tabs mid-edit does not clear the indicator; only
/// total disconnection of the identity (or expiry) does. Nothing here is
/// persisted.
pub struct IndicatorTracker {
    editing: HashMap<(String, Uuid), IndicatorEntry>,
    typing: HashMap<(String, Uuid), IndicatorEntry>,
    ttl: Duration,
}

impl IndicatorTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            editing: HashMap::new(),
            typing: HashMap::new(),
            ttl,
        }
    }

    fn set_mut(&mut self, set: IndicatorSet) -> &mut HashMap<(String, Uuid), IndicatorEntry> {
        match set {
            IndicatorSet::Editing => &mut self.editing,
            IndicatorSet::Typing => &mut self.typing,
        }
    }

    /// Idempotent insert. Returns true only when the entry is new; a
    /// re-raise refreshes the expiry clock and returns false so callers do
    /// not broadcast a duplicate transition.
    pub fn raise(&mut self, set: IndicatorSet, task_id: &str, identity: &Identity, now: Instant) -> bool {
        let key = (task_id.to_string(), identity.id);
        match self.set_mut(set).entry(key) {
            std::collections::hash_map::Entry::Occupied(mut occupied) => {
                occupied.get_mut().raised_at = now;
                false
            }
            std::collections::hash_map::Entry::Vacant(vacant) => {
                vacant.insert(IndicatorEntry {
                    identity: identity.clone(),
                    raised_at: now,
                });
                true
            }
        }
    }

    /// Idempotent removal. Returns the removed identity, or None when the
    /// entry did not exist (no broadcast in that case).
    pub fn lower(&mut self, set: IndicatorSet, task_id: &str, user_id: Uuid) -> Option<Identity> {
        self.set_mut(set)
            .remove(&(task_id.to_string(), user_id))
            .map(|entry| entry.identity)
    }

    /// Remove every entry held by an identity across both sets. Invoked by
    /// the disconnect path when the identity's last connection disappears;
    /// this is what keeps a crashed client from leaving a permanent "is
    /// typing" ghost.
    pub fn clear_for_identity(&mut self, user_id: Uuid) -> Vec<(IndicatorSet, String, Identity)> {
        let mut cleared = Vec::new();
        for set in [IndicatorSet::Editing, IndicatorSet::Typing] {
            let table = self.set_mut(set);
            let keys: Vec<(String, Uuid)> = table
                .keys()
                .filter(|(_, uid)| *uid == user_id)
                .cloned()
                .collect();
            for key in keys {
                if let Some(entry) = table.remove(&key) {
                    cleared.push((set, key.0, entry.identity));
                }
            }
        }
        cleared
    }

    /// Expire entries older than the configured maximum age. Covers the
    /// client whose lower call was lost while its socket stayed alive.
    pub fn sweep(&mut self, now: Instant) -> Vec<(IndicatorSet, String, Identity)> {
        let ttl = self.ttl;
        let mut expired = Vec::new();
        for set in [IndicatorSet::Editing, IndicatorSet::Typing] {
            let table = self.set_mut(set);
            let keys: Vec<(String, Uuid)> = table
                .iter()
                .filter(|(_, entry)| now.duration_since(entry.raised_at) >= ttl)
                .map(|(key, _)| key.clone())
                .collect();
            for key in keys {
                if let Some(entry) = table.remove(&key) {
                    expired.push((set, key.0, entry.identity));
                }
            }
        }
        expired
    }

    pub fn count(&self, set: IndicatorSet) -> usize {
        match set {
            IndicatorSet::Editing => self.editing.len(),
            IndicatorSet::Typing => self.typing.len(),
        }
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

    fn tracker() -> IndicatorTracker {
        IndicatorTracker::new(Duration::from_secs(10))
    }

    #[test]
    fn raise_is_idempotent() {
        let mut ind = tracker();
        let alice = identity("Alice");
        let now = Instant::now();

        assert!(ind.raise(IndicatorSet::Typing, "t1", &alice, now));
        assert!(!ind.raise(IndicatorSet::Typing, "t1", &alice, now));
        assert_eq!(ind.count(IndicatorSet::Typing), 1);
    }

    #[test]
    fn lower_missing_entry_is_a_no_op() {
        let mut ind = tracker();
        let alice = identity("Alice");
        assert!(ind.lower(IndicatorSet::Editing, "t1", alice.id).is_none());

        ind.raise(IndicatorSet::Editing, "t1", &alice, Instant::now());
        assert_eq!(ind.lower(IndicatorSet::Editing, "t1", alice.id), Some(alice.clone()));
        assert!(ind.lower(IndicatorSet::Editing, "t1", alice.id).is_none());
    }

    #[test]
    fn sets_are_independent() {
        let mut ind = tracker();
        let alice = identity("Alice");
        let now = Instant::now();

        ind.raise(IndicatorSet::Editing, "t1", &alice, now);
        assert_eq!(ind.count(IndicatorSet::Typing), 0);
        assert!(ind.lower(IndicatorSet::Typing, "t1", alice.id).is_none());
        assert_eq!(ind.count(IndicatorSet::Editing), 1);
    }

    #[test]
    fn clear_for_identity_spans_both_sets() {
        let mut ind = tracker();
        let alice = identity("Alice");
        let bob = identity("Bob");
        let now = Instant::now();

        ind.raise(IndicatorSet::Editing, "t1", &alice, now);
        ind.raise(IndicatorSet::Typing, "t2", &alice, now);
        ind.raise(IndicatorSet::Typing, "t2", &bob, now);

        let cleared = ind.clear_for_identity(alice.id);
        assert_eq!(cleared.len(), 2);
        assert!(cleared.iter().all(|(_, _, ident)| ident.id == alice.id));
        assert_eq!(ind.count(IndicatorSet::Editing), 0);
        assert_eq!(ind.count(IndicatorSet::Typing), 1);
    }

    #[test]
    fn sweep_expires_stale_entries_and_re_raise_re_arms() {
        let mut ind = tracker();
        let alice = identity("Alice");
        let bob = identity("Bob");
        let start = Instant::now();

        ind.raise(IndicatorSet::Typing, "t1", &alice, start);
        ind.raise(IndicatorSet::Typing, "t1", &bob, start);

        // Bob re-raises half way through the window.
        let halfway = start + Duration::from_secs(6);
        assert!(!ind.raise(IndicatorSet::Typing, "t1", &bob, halfway));

        let expired = ind.sweep(start + Duration::from_secs(10));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].2.id, alice.id);
        assert_eq!(ind.count(IndicatorSet::Typing), 1);
    }
}
