/**
 * Realtime Channel Events
 *
 * This module defines the events that travel over a session's persistent
 * connection, in both directions, as tagged JSON:
 *
 * ```json
 * {"event": "send_message", "sender": "...", "receiver": "...", "message": "hi"}
 * ```
 *
 * Every event name has a fixed payload shape. The server constructs
 * `ServerEvent` variants and the client pattern-matches on them; there is no
 * probing for optional fields.
 *
 * # Direction
 *
 * - `ClientEvent` - client to server. A session's first event must be
 *   `join`; anything received before it is dropped.
 * - `ServerEvent` - server to client. Pushes are best-effort: a failed or
 *   missed push is recovered by the client's next history fetch, never by
 *   retransmission.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::SharedError;
use super::messaging::{ChatMessage, FriendRequest, Notification, NotificationKind};

/// Durable presence status written through to the user-status collaborator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Online,
    Offline,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Online => "online",
            UserStatus::Offline => "offline",
        }
    }
}

/// Events sent by a client over its session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Must be the first event on a session
    Join { user_id: Uuid },
    /// Send a text message to another user
    SendMessage {
        sender: Uuid,
        receiver: Uuid,
        message: String,
        /// Client-side correlation id echoed back in `message_sent`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temp_id: Option<String>,
    },
    /// Mark every unread message in a conversation as read by `user_id`
    MarkMessagesRead { conversation_id: Uuid, user_id: Uuid },
    /// Send a friend request
    SendFriendRequest { sender: Uuid, receiver: Uuid },
    /// Accept a pending friend request
    FriendRequestAccepted { request_id: Uuid },
    /// Decline a pending friend request
    FriendRequestDeclined { request_id: Uuid },
    /// Withdraw a request the sender previously made
    CancelFriendRequest { sender: Uuid, receiver: Uuid },
    /// Remove an existing friendship, symmetric
    RemoveFriend { user_id: Uuid, friend_id: Uuid },
    /// Persist and deliver a generic notification
    SendNotification {
        sender: Uuid,
        receiver: Uuid,
        kind: NotificationKind,
        message: String,
    },
    /// Mark a stored notification as read
    MarkNotificationRead { notification_id: Uuid, user_id: Uuid },
    /// Transient typing hint, no persistence
    TypingStart {
        sender: Uuid,
        receiver: Uuid,
        conversation_id: Uuid,
    },
    TypingStop {
        sender: Uuid,
        receiver: Uuid,
        conversation_id: Uuid,
    },
}

impl ClientEvent {
    /// Parse one frame off the wire
    pub fn from_json(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode for the wire
    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Events pushed by the server to a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A persisted message delivered to its recipient's sessions.
    /// Never pushed to the sender; the sender gets `message_sent` instead.
    ReceiveMessage { message: ChatMessage },
    /// The return value of a send, delivered only to the session that sent it
    MessageSent {
        message: ChatMessage,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temp_id: Option<String>,
    },
    /// Someone read a conversation; best-effort broadcast to participants
    MessagesRead {
        conversation_id: Uuid,
        read_by: Uuid,
        read_at: DateTime<Utc>,
    },
    /// A friend request arrived for this user
    NewFriendRequest {
        request: FriendRequest,
        notification: Notification,
    },
    /// A request this user sent was accepted or declined
    FriendRequestStatus { notification: Notification },
    /// A generic notification arrived
    NewNotification { notification: Notification },
    /// One of this user's own sessions marked a notification read
    NotificationRead { notification_id: Uuid },
    /// Typing hint relayed from the counterpart
    UserTyping {
        user_id: Uuid,
        conversation_id: Uuid,
        is_typing: bool,
    },
    /// Presence transitions, broadcast to all other sessions
    UserOnline {
        user_id: Uuid,
        status: UserStatus,
        last_seen: DateTime<Utc>,
    },
    UserOffline {
        user_id: Uuid,
        status: UserStatus,
        last_seen: DateTime<Utc>,
    },
    /// A client-initiated operation failed
    Error {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temp_id: Option<String>,
    },
}

impl ServerEvent {
    /// Parse one frame off the wire
    pub fn from_json(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode for the wire
    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Wire name of the event, as it appears in the `event` tag
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::ReceiveMessage { .. } => "receive_message",
            ServerEvent::MessageSent { .. } => "message_sent",
            ServerEvent::MessagesRead { .. } => "messages_read",
            ServerEvent::NewFriendRequest { .. } => "new_friend_request",
            ServerEvent::FriendRequestStatus { .. } => "friend_request_status",
            ServerEvent::NewNotification { .. } => "new_notification",
            ServerEvent::NotificationRead { .. } => "notification_read",
            ServerEvent::UserTyping { .. } => "user_typing",
            ServerEvent::UserOnline { .. } => "user_online",
            ServerEvent::UserOffline { .. } => "user_offline",
            ServerEvent::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_tag_names() {
        let event = ClientEvent::Join { user_id: Uuid::new_v4() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "join");

        let event = ClientEvent::SendMessage {
            sender: Uuid::new_v4(),
            receiver: Uuid::new_v4(),
            message: "hello".to_string(),
            temp_id: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "send_message");
        assert!(json.get("temp_id").is_none());
    }

    #[test]
    fn test_server_event_tag_matches_name() {
        let event = ServerEvent::MessagesRead {
            conversation_id: Uuid::new_v4(),
            read_by: Uuid::new_v4(),
            read_at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
    }

    #[test]
    fn test_client_event_roundtrip() {
        let event = ClientEvent::TypingStart {
            sender: Uuid::new_v4(),
            receiver: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ClientEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"event":"launch_missiles"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_receive_message_carries_full_message() {
        let message = ChatMessage::new_text(Uuid::new_v4(), Uuid::new_v4(), "hi".to_string());
        let event = ServerEvent::ReceiveMessage { message: message.clone() };
        let json = serde_json::to_string(&event).unwrap();
        match serde_json::from_str::<ServerEvent>(&json).unwrap() {
            ServerEvent::ReceiveMessage { message: got } => assert_eq!(got.id, message.id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
