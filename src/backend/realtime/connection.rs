/**
 * Connection Lifecycle Manager
 *
 * Owns the per-session WebSocket handshake and teardown. Each session walks
 * a small state machine:
 *
 * ```text
 * connecting -> joined -> closed
 * ```
 *
 * - `connecting` - socket is open but the client has not identified itself.
 *   The first event must be `join`; anything else is dropped silently.
 * - `joined` - the session is registered in the presence registry and events
 *   are dispatched to the delivery pipeline and social event router.
 * - `closed` - the socket is gone; the session is unregistered and, if it
 *   was the user's last one, an offline transition is broadcast.
 *
 * Durable status writes ("online"/"offline" + last seen) are fire-and-forget:
 * a failure is logged and never blocks the session or delivery.
 */
use axum::{
    extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::backend::error::RealtimeError;
use crate::backend::presence::{PresenceRegistry, SessionHandle};
use crate::backend::server::state::AppState;
use crate::backend::store::StatusStore;
use crate::shared::{ClientEvent, ServerEvent, UserStatus};

use super::push_to_user;

/// Per-session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionPhase {
    /// Socket open, identity unknown
    Connecting,
    /// Identity registered in the presence registry
    Joined(Uuid),
    /// Torn down
    Closed,
}

/// Handle a WebSocket upgrade (GET /ws)
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session(socket, state))
}

/// Drive one session from accept to teardown
async fn handle_session(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    tracing::debug!("session {} connected", session_id);

    // Writer task: drain the session's event queue into the socket. Ends
    // when every sender clone (registry entries included) is dropped.
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event.to_json() {
                Ok(text) => {
                    if ws_tx.send(WsMessage::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!("failed to serialize {} event: {}", event.name(), err);
                }
            }
        }
        let _ = ws_tx.close().await;
    });

    let mut phase = SessionPhase::Connecting;

    while let Some(result) = ws_rx.next().await {
        let message = match result {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!("session {} transport error: {}", session_id, err);
                break;
            }
        };

        let text = match message {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            // Pings are answered by axum; binary frames are not part of the protocol.
            _ => continue,
        };

        let event = match ClientEvent::from_json(text.as_str()) {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!("session {} sent an unparseable event: {}", session_id, err);
                continue;
            }
        };

        match (phase, event) {
            (SessionPhase::Connecting, ClientEvent::Join { user_id }) => {
                state
                    .presence
                    .register(user_id, SessionHandle::new(session_id, tx.clone()));
                phase = SessionPhase::Joined(user_id);
                tracing::info!("user {} joined on session {}", user_id, session_id);

                write_status(&state.status, user_id, UserStatus::Online);
                broadcast_presence(
                    &state.presence,
                    session_id,
                    &ServerEvent::UserOnline {
                        user_id,
                        status: UserStatus::Online,
                        last_seen: Utc::now(),
                    },
                );
            }
            (SessionPhase::Connecting, _) => {
                // No identity yet: dropped silently per the channel contract.
                tracing::debug!("session {} sent an event before join, dropping", session_id);
            }
            (SessionPhase::Joined(user_id), event) => {
                handle_joined_event(user_id, session_id, &tx, &state, event).await;
            }
            (SessionPhase::Closed, _) => break,
        }
    }

    if let SessionPhase::Joined(user_id) = std::mem::replace(&mut phase, SessionPhase::Closed) {
        if state.presence.unregister(session_id).is_some() {
            let last_seen = Utc::now();
            tracing::info!("user {} now offline (session {})", user_id, session_id);
            write_status(&state.status, user_id, UserStatus::Offline);
            broadcast_presence(
                &state.presence,
                session_id,
                &ServerEvent::UserOffline {
                    user_id,
                    status: UserStatus::Offline,
                    last_seen,
                },
            );
        } else {
            tracing::debug!(
                "session {} closed, user {} still reachable elsewhere",
                session_id,
                user_id
            );
        }
    } else {
        tracing::debug!("session {} closed before join", session_id);
    }

    drop(tx);
    let _ = writer.await;
}

/// Dispatch one event from a joined session
async fn handle_joined_event(
    user_id: Uuid,
    session_id: Uuid,
    tx: &mpsc::UnboundedSender<ServerEvent>,
    state: &AppState,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Join { .. } => {
            tracing::debug!("duplicate join on session {} ignored", session_id);
        }
        ClientEvent::SendMessage {
            sender,
            receiver,
            message,
            temp_id,
        } => {
            if sender != user_id {
                reject_identity_mismatch(tx, temp_id);
                return;
            }
            match state.pipeline.send(sender, receiver, &message).await {
                Ok(message) => {
                    // The direct return value of the send; the recipient-style
                    // push went to the receiver's sessions only.
                    let _ = tx.send(ServerEvent::MessageSent { message, temp_id });
                }
                Err(err) => send_error(tx, &err, temp_id),
            }
        }
        ClientEvent::MarkMessagesRead {
            conversation_id,
            user_id: reader,
        } => {
            if reader != user_id {
                reject_identity_mismatch(tx, None);
                return;
            }
            if let Err(err) = state.pipeline.mark_read(conversation_id, reader).await {
                send_error(tx, &err, None);
            }
        }
        ClientEvent::SendFriendRequest { sender, receiver } => {
            if sender != user_id {
                reject_identity_mismatch(tx, None);
                return;
            }
            if let Err(err) = state.social.send_friend_request(sender, receiver).await {
                send_error(tx, &err, None);
            }
        }
        ClientEvent::FriendRequestAccepted { request_id } => {
            if let Err(err) = state.social.accept_friend_request(request_id, user_id).await {
                send_error(tx, &err, None);
            }
        }
        ClientEvent::FriendRequestDeclined { request_id } => {
            if let Err(err) = state.social.decline_friend_request(request_id, user_id).await {
                send_error(tx, &err, None);
            }
        }
        ClientEvent::CancelFriendRequest { sender, receiver } => {
            if sender != user_id {
                reject_identity_mismatch(tx, None);
                return;
            }
            if let Err(err) = state.social.cancel_friend_request(sender, receiver).await {
                send_error(tx, &err, None);
            }
        }
        ClientEvent::RemoveFriend {
            user_id: remover,
            friend_id,
        } => {
            if remover != user_id {
                reject_identity_mismatch(tx, None);
                return;
            }
            if let Err(err) = state.social.remove_friend(remover, friend_id).await {
                send_error(tx, &err, None);
            }
        }
        ClientEvent::SendNotification {
            sender,
            receiver,
            kind,
            message,
        } => {
            if sender != user_id {
                reject_identity_mismatch(tx, None);
                return;
            }
            if let Err(err) = state.social.send_notification(sender, receiver, kind, &message).await {
                send_error(tx, &err, None);
            }
        }
        ClientEvent::MarkNotificationRead {
            notification_id,
            user_id: reader,
        } => {
            if reader != user_id {
                reject_identity_mismatch(tx, None);
                return;
            }
            if let Err(err) = state
                .social
                .mark_notification_read(notification_id, reader, Some(session_id))
                .await
            {
                send_error(tx, &err, None);
            }
        }
        ClientEvent::TypingStart {
            sender,
            receiver,
            conversation_id,
        } => {
            relay_typing(state, user_id, sender, receiver, conversation_id, true);
        }
        ClientEvent::TypingStop {
            sender,
            receiver,
            conversation_id,
        } => {
            relay_typing(state, user_id, sender, receiver, conversation_id, false);
        }
    }
}

/// Typing hints are transient: no persistence, no error reporting
fn relay_typing(
    state: &AppState,
    joined: Uuid,
    sender: Uuid,
    receiver: Uuid,
    conversation_id: Uuid,
    is_typing: bool,
) {
    if sender != joined {
        return;
    }
    push_to_user(
        &state.presence,
        receiver,
        &ServerEvent::UserTyping {
            user_id: sender,
            conversation_id,
            is_typing,
        },
    );
}

/// Best-effort presence broadcast to every session except the originating one
fn broadcast_presence(presence: &Arc<PresenceRegistry>, origin: Uuid, event: &ServerEvent) {
    for handle in presence.all_handles() {
        if handle.id() == origin {
            continue;
        }
        handle.push(event.clone());
    }
}

/// Fire-and-forget durable status write
fn write_status(status: &Arc<dyn StatusStore>, user_id: Uuid, value: UserStatus) {
    let store = status.clone();
    tokio::spawn(async move {
        if let Err(err) = store.set_status(user_id, value, Utc::now()).await {
            tracing::warn!("durable status write for {} failed: {}", user_id, err);
        }
    });
}

fn send_error(tx: &mpsc::UnboundedSender<ServerEvent>, err: &RealtimeError, temp_id: Option<String>) {
    let _ = tx.send(ServerEvent::Error {
        code: err.code().to_string(),
        message: err.to_string(),
        temp_id,
    });
}

fn reject_identity_mismatch(tx: &mpsc::UnboundedSender<ServerEvent>, temp_id: Option<String>) {
    let err = RealtimeError::invalid_argument("event identity does not match session identity");
    send_error(tx, &err, temp_id);
}
