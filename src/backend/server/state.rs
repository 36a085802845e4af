/**
 * Application State Management
 *
 * `AppState` is the central state container handed to axum. It owns the
 * presence registry (the subsystem's only process-wide mutable state), the
 * delivery pipeline and the social event router; the storage facade is
 * reachable only through those components plus the status store used by the
 * connection lifecycle.
 *
 * # Thread Safety
 *
 * Everything is behind `Arc`; the presence registry guards its maps with a
 * mutex and the stores serialize their own writes.
 */
use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::presence::PresenceRegistry;
use crate::backend::realtime::{DeliveryPipeline, SocialEventRouter};
use crate::backend::store::StatusStore;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Who is connected right now, and over which sessions
    pub presence: Arc<PresenceRegistry>,
    /// Message delivery pipeline
    pub pipeline: Arc<DeliveryPipeline>,
    /// Friend-request and notification routing
    pub social: Arc<SocialEventRouter>,
    /// Durable user-status collaborator (write-through on join/disconnect)
    pub status: Arc<dyn StatusStore>,
}

/// Allow handlers to extract the presence registry directly
impl FromRef<AppState> for Arc<PresenceRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.presence.clone()
    }
}

/// Allow handlers to extract the delivery pipeline directly
impl FromRef<AppState> for Arc<DeliveryPipeline> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.pipeline.clone()
    }
}

/// Allow handlers to extract the social event router directly
impl FromRef<AppState> for Arc<SocialEventRouter> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.social.clone()
    }
}
