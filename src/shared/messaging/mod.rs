//! Messaging Types
//!
//! Durable entities of the messaging subsystem: conversations, chat messages
//! with read receipts, friend requests and notifications. These are the
//! shapes persisted by the storage facade and carried in realtime events.

/// Conversation data structure
pub mod conversation;

/// Chat message data structure
pub mod message;

/// Friend request data structure
pub mod friend_request;

/// Notification data structure
pub mod notification;

pub use conversation::{Conversation, ConversationKind, Participant, ParticipantRole};
pub use friend_request::FriendRequest;
pub use message::{ChatMessage, MessageHistoryResponse, MessageKind, ReadReceipt, SendMessageRequest};
pub use notification::{Notification, NotificationKind};
