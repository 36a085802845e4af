//! Chat Message Data Structure
//!
//! Represents a message in a conversation, together with its grow-only
//! read-receipt list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of message content
///
/// Only text messages flow through the delivery pipeline; the system tag is
/// kept for membership events rendered inline in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text message
    Text,
    /// System message (e.g. "User joined")
    System,
}

impl Default for MessageKind {
    fn default() -> Self {
        MessageKind::Text
    }
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::System => "system",
        }
    }

    /// Parse from string (database)
    pub fn from_str(s: &str) -> Self {
        match s {
            "system" => MessageKind::System,
            _ => MessageKind::Text,
        }
    }
}

/// Record that a given user has viewed a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadReceipt {
    /// The reader
    pub user_id: Uuid,
    /// When the reader first saw the message
    pub read_at: DateTime<Utc>,
}

/// Represents a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Unique message ID, immutable once persisted
    pub id: Uuid,
    /// Conversation this message belongs to
    pub conversation_id: Uuid,
    /// User who sent the message
    pub sender_id: Uuid,
    /// Type of message
    #[serde(default)]
    pub kind: MessageKind,
    /// Message content (text for Text kind)
    pub content: String,
    /// When the message was sent
    pub created_at: DateTime<Utc>,
    /// Who has read the message; append-only
    #[serde(default)]
    pub read_by: Vec<ReadReceipt>,
    /// Soft-delete flag
    #[serde(default)]
    pub is_deleted: bool,
}

impl ChatMessage {
    /// Create a new text message, with the sender pre-seeded as a reader
    /// (a sender has by definition seen their own message).
    pub fn new_text(conversation_id: Uuid, sender_id: Uuid, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            kind: MessageKind::Text,
            content,
            created_at: now,
            read_by: vec![ReadReceipt {
                user_id: sender_id,
                read_at: now,
            }],
            is_deleted: false,
        }
    }

    /// Whether the given user appears in the read-receipt list
    pub fn is_read_by(&self, user_id: Uuid) -> bool {
        self.read_by.iter().any(|r| r.user_id == user_id)
    }

    /// Append a read receipt if the user has none yet. Receipts are never
    /// removed or overwritten. Returns true if a receipt was added.
    pub fn mark_read_by(&mut self, user_id: Uuid, read_at: DateTime<Utc>) -> bool {
        if self.is_read_by(user_id) {
            return false;
        }
        self.read_by.push(ReadReceipt { user_id, read_at });
        true
    }

    /// Get a preview of the message (first N characters)
    pub fn preview(&self, max_len: usize) -> String {
        if self.content.chars().count() <= max_len {
            self.content.clone()
        } else {
            let mut preview: String = self.content.chars().take(max_len.saturating_sub(3)).collect();
            preview.push_str("...");
            preview
        }
    }
}

/// Body of a REST send
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub sender: Uuid,
    pub receiver: Uuid,
    pub message: String,
}

/// One page of conversation history, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHistoryResponse {
    pub messages: Vec<ChatMessage>,
    pub page: u32,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_is_seeded_as_reader() {
        let sender = Uuid::new_v4();
        let msg = ChatMessage::new_text(Uuid::new_v4(), sender, "hello".to_string());
        assert!(msg.is_read_by(sender));
        assert_eq!(msg.read_by.len(), 1);
    }

    #[test]
    fn test_mark_read_by_is_idempotent() {
        let reader = Uuid::new_v4();
        let mut msg = ChatMessage::new_text(Uuid::new_v4(), Uuid::new_v4(), "hi".to_string());
        assert!(msg.mark_read_by(reader, Utc::now()));
        assert!(!msg.mark_read_by(reader, Utc::now()));
        assert_eq!(msg.read_by.len(), 2);
    }

    #[test]
    fn test_preview_truncates() {
        let msg = ChatMessage::new_text(Uuid::new_v4(), Uuid::new_v4(), "a".repeat(40));
        let preview = msg.preview(10);
        assert_eq!(preview.chars().count(), 10);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_kind_roundtrip_through_db_strings() {
        assert_eq!(MessageKind::from_str(MessageKind::System.as_str()), MessageKind::System);
        assert_eq!(MessageKind::from_str("unknown"), MessageKind::Text);
    }
}
