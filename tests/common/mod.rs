//! Shared test helpers
//!
//! Builds the realtime components around the in-memory store, with plain
//! channel receivers standing in for live sessions.
#![allow(dead_code)]

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use ripple::backend::presence::{PresenceRegistry, SessionHandle};
use ripple::backend::realtime::{DeliveryPipeline, RouterConfig, SocialEventRouter};
use ripple::backend::server::AppState;
use ripple::backend::store::MemoryStore;
use ripple::shared::ServerEvent;

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub presence: Arc<PresenceRegistry>,
    pub pipeline: Arc<DeliveryPipeline>,
    pub social: Arc<SocialEventRouter>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_router_config(RouterConfig::default())
    }

    pub fn with_router_config(config: RouterConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let presence = Arc::new(PresenceRegistry::new());
        let pipeline = Arc::new(DeliveryPipeline::new(store.clone(), presence.clone()));
        let social = Arc::new(SocialEventRouter::new(store.clone(), presence.clone(), config));
        Self {
            store,
            presence,
            pipeline,
            social,
        }
    }

    /// Register a live session for a user and hand back its event stream
    pub fn connect(&self, user: Uuid) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.presence
            .register(user, SessionHandle::new(Uuid::new_v4(), tx));
        rx
    }

    /// Full application state over the same components
    pub fn app_state(&self) -> AppState {
        AppState {
            presence: self.presence.clone(),
            pipeline: self.pipeline.clone(),
            social: self.social.clone(),
            status: self.store.clone(),
        }
    }
}

/// Drain everything currently queued for a session
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
