//! Realtime Module
//!
//! The components that sit between live sessions and the durable store:
//!
//! - **`connection`** - per-session WebSocket lifecycle (join, dispatch,
//!   disconnect) and presence transitions
//! - **`resolver`** - find-or-create of direct conversations
//! - **`delivery`** - the message delivery pipeline (persist, then push)
//! - **`router`** - friend-request and notification routing
//!
//! All pushes are best-effort: a message is durably recorded before its
//! delivery push is attempted, so a missed push costs nothing but latency
//! until the recipient's next history fetch.

/// WebSocket connection lifecycle
pub mod connection;

/// Message delivery pipeline
pub mod delivery;

/// Direct-conversation resolver
pub mod resolver;

/// Social event router
pub mod router;

pub use connection::ws_handler;
pub use delivery::DeliveryPipeline;
pub use resolver::ConversationResolver;
pub use router::{RouterConfig, SocialEventRouter};

use std::sync::Arc;
use uuid::Uuid;

use crate::backend::presence::PresenceRegistry;
use crate::shared::ServerEvent;

/// Push an event to every active session of a user. Returns the number of
/// sessions the event was queued for; zero means the user is not reachable
/// and the caller relies on durable storage.
pub(crate) fn push_to_user(presence: &Arc<PresenceRegistry>, user_id: Uuid, event: &ServerEvent) -> usize {
    let sessions = presence.sessions_for(user_id);
    if sessions.is_empty() {
        tracing::debug!("no live sessions for {}, skipping {} push", user_id, event.name());
        return 0;
    }

    let mut delivered = 0;
    for session in &sessions {
        if session.push(event.clone()) {
            delivered += 1;
        } else {
            tracing::warn!(
                "push of {} to session {} of {} failed",
                event.name(),
                session.id(),
                user_id
            );
        }
    }
    delivered
}
