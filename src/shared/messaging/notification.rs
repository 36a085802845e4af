//! Notification Data Structure
//!
//! A social event targeted at exactly one recipient: friend-request activity
//! or a generic notification with an originating actor and a human-readable
//! summary. Unlike messages, notifications have no conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone sent the target a friend request
    FriendRequest,
    /// The target's friend request was accepted
    FriendAccept,
    /// The target's friend request was declined
    FriendDecline,
    /// Someone reacted to the target's post
    PostLike,
    /// Someone commented on the target's post
    PostComment,
    /// A chat message notification
    Message,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::FriendRequest => "friend_request",
            NotificationKind::FriendAccept => "friend_accept",
            NotificationKind::FriendDecline => "friend_decline",
            NotificationKind::PostLike => "post_like",
            NotificationKind::PostComment => "post_comment",
            NotificationKind::Message => "message",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "friend_request" => Some(NotificationKind::FriendRequest),
            "friend_accept" => Some(NotificationKind::FriendAccept),
            "friend_decline" => Some(NotificationKind::FriendDecline),
            "post_like" => Some(NotificationKind::PostLike),
            "post_comment" => Some(NotificationKind::PostComment),
            "message" => Some(NotificationKind::Message),
            _ => None,
        }
    }
}

/// Represents a notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,
    /// Target user
    pub user_id: Uuid,
    /// Originating actor
    pub actor_id: Uuid,
    /// Kind tag
    pub kind: NotificationKind,
    /// Human-readable summary
    pub message: String,
    /// Whether the target has seen it
    pub is_read: bool,
    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a new unread notification
    pub fn new(user_id: Uuid, actor_id: Uuid, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            actor_id,
            kind,
            message: message.into(),
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip_through_db_strings() {
        for kind in [
            NotificationKind::FriendRequest,
            NotificationKind::FriendAccept,
            NotificationKind::FriendDecline,
            NotificationKind::PostLike,
            NotificationKind::PostComment,
            NotificationKind::Message,
        ] {
            assert_eq!(NotificationKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::from_str("dating_match"), None);
    }

    #[test]
    fn test_new_notification_is_unread() {
        let n = Notification::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NotificationKind::FriendRequest,
            "You have a new friend request",
        );
        assert!(!n.is_read);
    }
}
