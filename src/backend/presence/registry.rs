//! Presence Registry
//!
//! Maps user identities to their active session handles. A user may have
//! zero, one or many concurrent sessions (multiple tabs, multiple devices).
//! The registry is the only process-wide mutable state in the realtime
//! subsystem: the connection lifecycle registers and unregisters sessions,
//! delivery components only read.
//!
//! Invariant: a session handle appears under at most one user identity at a
//! time, and removing a user's last session yields the "now offline" signal
//! exactly once.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::shared::ServerEvent;

/// Opaque reference to one live connection.
///
/// Holds the sending half of the session's outbound event queue; the
/// connection lifecycle owns the receiving half and drains it into the
/// socket. Dropping every clone of the sender closes the queue, so a push to
/// a dead session fails instead of blocking.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl SessionHandle {
    /// Create a handle around a session's outbound queue
    pub fn new(id: Uuid, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self { id, sender }
    }

    /// The session's identity
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue an event for this session. Returns false if the session's
    /// receiving half is gone; callers treat that as an ordinary missed
    /// push, not an error.
    pub fn push(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// userIdentity -> sessionId -> handle
    users: HashMap<Uuid, HashMap<Uuid, SessionHandle>>,
    /// sessionId -> owning userIdentity
    owners: HashMap<Uuid, Uuid>,
}

/// In-memory map from user identity to active session handles
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    inner: Mutex<Inner>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session handle to a user's session set. Idempotent: registering
    /// the same session for the same user again is a no-op. If the session
    /// was registered under a different user it is re-homed, preserving the
    /// at-most-one-owner invariant.
    pub fn register(&self, user_id: Uuid, handle: SessionHandle) {
        let mut inner = self.inner.lock().unwrap();
        let session_id = handle.id();

        if let Some(previous) = inner.owners.get(&session_id).copied() {
            if previous != user_id {
                if let Some(sessions) = inner.users.get_mut(&previous) {
                    sessions.remove(&session_id);
                    if sessions.is_empty() {
                        inner.users.remove(&previous);
                    }
                }
            }
        }

        inner.owners.insert(session_id, user_id);
        inner.users.entry(user_id).or_default().insert(session_id, handle);
    }

    /// Remove a session from whichever user owns it. Returns the owning user
    /// identity when this removed the user's last session ("user now
    /// offline"); unknown sessions and non-final removals return `None`.
    pub fn unregister(&self, session_id: Uuid) -> Option<Uuid> {
        let mut inner = self.inner.lock().unwrap();
        let user_id = inner.owners.remove(&session_id)?;

        let now_offline = match inner.users.get_mut(&user_id) {
            Some(sessions) => {
                sessions.remove(&session_id);
                sessions.is_empty()
            }
            None => false,
        };

        if now_offline {
            inner.users.remove(&user_id);
            Some(user_id)
        } else {
            None
        }
    }

    /// The user's active session handles. An empty result means "not
    /// currently reachable; rely on durable storage only" and is not an
    /// error.
    pub fn sessions_for(&self, user_id: Uuid) -> Vec<SessionHandle> {
        let inner = self.inner.lock().unwrap();
        inner
            .users
            .get(&user_id)
            .map(|sessions| sessions.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether the user has at least one active session
    pub fn is_online(&self, user_id: Uuid) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.users.get(&user_id).map_or(false, |s| !s.is_empty())
    }

    /// Snapshot of currently-online user identities, for diagnostics
    pub fn online_users(&self) -> Vec<Uuid> {
        let inner = self.inner.lock().unwrap();
        inner.users.keys().copied().collect()
    }

    /// Snapshot of every active session handle, for best-effort broadcasts
    pub fn all_handles(&self) -> Vec<SessionHandle> {
        let inner = self.inner.lock().unwrap();
        inner
            .users
            .values()
            .flat_map(|sessions| sessions.values().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: Uuid) -> (SessionHandle, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SessionHandle::new(id, tx), rx)
    }

    #[test]
    fn test_multi_session_register_unregister() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let (s1, _rx1) = handle(Uuid::new_v4());
        let (s2, _rx2) = handle(Uuid::new_v4());

        registry.register(user, s1.clone());
        registry.register(user, s2.clone());

        let ids: Vec<Uuid> = registry.sessions_for(user).iter().map(|h| h.id()).collect();
        assert!(ids.contains(&s1.id()));
        assert!(ids.contains(&s2.id()));

        assert_eq!(registry.unregister(s1.id()), None);
        let remaining = registry.sessions_for(user);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id(), s2.id());

        // Last removal signals offline exactly once
        assert_eq!(registry.unregister(s2.id()), Some(user));
        assert_eq!(registry.unregister(s2.id()), None);
        assert!(registry.sessions_for(user).is_empty());
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let (s1, _rx) = handle(Uuid::new_v4());

        registry.register(user, s1.clone());
        registry.register(user, s1.clone());
        assert_eq!(registry.sessions_for(user).len(), 1);
    }

    #[test]
    fn test_session_belongs_to_one_user() {
        let registry = PresenceRegistry::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let (s1, _rx) = handle(Uuid::new_v4());

        registry.register(alice, s1.clone());
        registry.register(bob, s1.clone());

        assert!(registry.sessions_for(alice).is_empty());
        assert_eq!(registry.sessions_for(bob).len(), 1);
        assert!(!registry.is_online(alice));
        assert!(registry.is_online(bob));
    }

    #[test]
    fn test_offline_user_has_empty_sessions() {
        let registry = PresenceRegistry::new();
        assert!(registry.sessions_for(Uuid::new_v4()).is_empty());
        assert!(registry.online_users().is_empty());
    }

    #[test]
    fn test_push_reaches_registered_session() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let (s1, mut rx) = handle(Uuid::new_v4());
        registry.register(user, s1);

        let event = ServerEvent::NotificationRead { notification_id: Uuid::new_v4() };
        for session in registry.sessions_for(user) {
            assert!(session.push(event.clone()));
        }
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn test_push_to_dropped_session_fails_quietly() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let (s1, rx) = handle(Uuid::new_v4());
        registry.register(user, s1);
        drop(rx);

        let sessions = registry.sessions_for(user);
        assert!(!sessions[0].push(ServerEvent::NotificationRead { notification_id: Uuid::new_v4() }));
    }
}
