/**
 * Router Configuration
 *
 * Combines the realtime and REST routes into a single axum router.
 *
 * # Routes
 *
 * - `GET /ws` - WebSocket upgrade; one session per connection
 * - `GET /api/conversations/{id}/messages` - paged history, newest first
 * - `POST /api/messages` - durable send, returns the persisted message
 * - `GET /api/online-users` - presence snapshot for diagnostics
 */
use axum::{routing::get, routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::backend::realtime::ws_handler;
use crate::backend::routes::api::{get_history, get_online_users, post_message};
use crate::backend::server::state::AppState;

/// Create the axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/conversations/{conversation_id}/messages", get(get_history))
        .route("/api/messages", post(post_message))
        .route("/api/online-users", get(get_online_users))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
