//! Property-based tests for the presence registry

use proptest::prelude::*;
use tokio::sync::mpsc;
use uuid::Uuid;

use ripple::backend::presence::{PresenceRegistry, SessionHandle};

fn session() -> SessionHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    // Receivers are dropped; pushes failing is fine for these properties.
    drop(rx);
    SessionHandle::new(Uuid::new_v4(), tx)
}

proptest! {
    /// However sessions are spread over users, each user is online while
    /// they have at least one session and the offline signal fires exactly
    /// once, on the last removal.
    #[test]
    fn offline_signal_fires_exactly_once(sessions_per_user in proptest::collection::vec(1usize..5, 1..8)) {
        let registry = PresenceRegistry::new();
        let mut owned: Vec<(Uuid, Vec<SessionHandle>)> = Vec::new();

        for &count in &sessions_per_user {
            let user = Uuid::new_v4();
            let handles: Vec<SessionHandle> = (0..count).map(|_| session()).collect();
            for handle in &handles {
                registry.register(user, handle.clone());
            }
            owned.push((user, handles));
        }

        prop_assert_eq!(registry.online_users().len(), owned.len());

        for (user, handles) in owned {
            let mut offline_signals = 0;
            for handle in &handles {
                if registry.unregister(handle.id()) == Some(user) {
                    offline_signals += 1;
                }
            }
            prop_assert_eq!(offline_signals, 1);
            prop_assert!(registry.sessions_for(user).is_empty());
        }

        prop_assert!(registry.online_users().is_empty());
    }

    /// Re-registering the same sessions repeatedly never inflates the set.
    #[test]
    fn register_is_idempotent_under_repetition(repeats in 1usize..5) {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let handles: Vec<SessionHandle> = (0..3).map(|_| session()).collect();

        for _ in 0..repeats {
            for handle in &handles {
                registry.register(user, handle.clone());
            }
        }

        prop_assert_eq!(registry.sessions_for(user).len(), handles.len());
    }
}
