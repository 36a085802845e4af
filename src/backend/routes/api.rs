//! REST Handlers
//!
//! The durable fallback/primary path used by clients alongside the realtime
//! channel. History is paged newest-first; the send endpoint returns the
//! full persisted message including its server-assigned identity.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::RealtimeError;
use crate::backend::server::state::AppState;
use crate::shared::messaging::{ChatMessage, MessageHistoryResponse, SendMessageRequest};

const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 200;

/// Query parameters for history paging
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Get conversation history (GET /api/conversations/{id}/messages)
pub async fn get_history(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<MessageHistoryResponse>, RealtimeError> {
    let page = params.page.unwrap_or(0);
    let page_size = params
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let messages = state
        .pipeline
        .history_page(
            conversation_id,
            page_size as i64,
            page as i64 * page_size as i64,
        )
        .await?;

    let has_more = messages.len() == page_size as usize;
    Ok(Json(MessageHistoryResponse {
        messages,
        page,
        has_more,
    }))
}

/// Send a message (POST /api/messages)
///
/// The response body is the authoritative local echo; the recipient's
/// sessions receive the matching `receive_message` push.
pub async fn post_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ChatMessage>, RealtimeError> {
    let message = state
        .pipeline
        .send(request.sender, request.receiver, &request.message)
        .await?;
    Ok(Json(message))
}

/// Currently-online users
#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineUsersResponse {
    pub users: Vec<Uuid>,
}

/// Presence snapshot for diagnostics (GET /api/online-users)
pub async fn get_online_users(State(state): State<AppState>) -> Json<OnlineUsersResponse> {
    Json(OnlineUsersResponse {
        users: state.presence.online_users(),
    })
}
