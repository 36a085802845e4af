/**
 * Server Initialization
 *
 * Wires the realtime subsystem together:
 *
 * 1. Load the optional database pool; pick the Postgres or in-memory store
 * 2. Create the presence registry
 * 3. Build the delivery pipeline and social event router around the
 *    registry and the storage facade (injected, never reached into)
 * 4. Create the router with all routes
 */
use axum::Router;
use std::sync::Arc;

use crate::backend::presence::PresenceRegistry;
use crate::backend::realtime::{DeliveryPipeline, RouterConfig, SocialEventRouter};
use crate::backend::routes::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;
use crate::backend::store::{ConversationStore, FriendStore, MemoryStore, PgStore, StatusStore};

/// Create and configure the axum application
pub async fn create_app(config: &ServerConfig) -> Router<()> {
    tracing::info!("Initializing ripple realtime server");

    let (conversations, friends, status) = build_stores().await;
    let state = build_state(config, conversations, friends, status);

    create_router(state)
}

/// Pick the storage backend: Postgres when configured, in-memory otherwise
async fn build_stores() -> (
    Arc<dyn ConversationStore>,
    Arc<dyn FriendStore>,
    Arc<dyn StatusStore>,
) {
    match load_database().await {
        Some(pool) => {
            let store = Arc::new(PgStore::new(pool));
            let conversations: Arc<dyn ConversationStore> = store.clone();
            let friends: Arc<dyn FriendStore> = store.clone();
            let status: Arc<dyn StatusStore> = store;
            (conversations, friends, status)
        }
        None => {
            let store = Arc::new(MemoryStore::new());
            let conversations: Arc<dyn ConversationStore> = store.clone();
            let friends: Arc<dyn FriendStore> = store.clone();
            let status: Arc<dyn StatusStore> = store;
            (conversations, friends, status)
        }
    }
}

/// Assemble the application state around a storage facade
pub fn build_state(
    config: &ServerConfig,
    conversations: Arc<dyn ConversationStore>,
    friends: Arc<dyn FriendStore>,
    status: Arc<dyn StatusStore>,
) -> AppState {
    let presence = Arc::new(PresenceRegistry::new());
    let pipeline = Arc::new(DeliveryPipeline::new(conversations, presence.clone()));
    let social = Arc::new(SocialEventRouter::new(
        friends,
        presence.clone(),
        RouterConfig {
            notify_on_decline: config.notify_on_decline,
        },
    ));

    tracing::info!(
        "Presence registry and delivery components initialized (notify_on_decline={})",
        config.notify_on_decline
    );

    AppState {
        presence,
        pipeline,
        social,
        status,
    }
}
